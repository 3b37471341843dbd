//! TLS configuration
//!
//! Builds the rustls acceptor used on both control and data channels, and
//! the connector used by the bundled client.

use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    ClientConfig, DigitallySignedStruct, Error as RustlsError, RootCertStore, ServerConfig,
    SignatureScheme,
};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::TransportError;

/// Loads the PEM certificate chain and private key from disk.
pub fn load_server_acceptor(
    cert_path: &Path,
    key_path: &Path,
) -> Result<TlsAcceptor, TransportError> {
    let cert_pem = fs::read(cert_path).map_err(|e| {
        TransportError::Certificate(format!("cannot read {}: {}", cert_path.display(), e))
    })?;
    let key_pem = fs::read(key_path).map_err(|e| {
        TransportError::PrivateKey(format!("cannot read {}: {}", key_path.display(), e))
    })?;

    let acceptor = server_acceptor_from_pem(&cert_pem, &key_pem)?;
    info!(
        "Loaded TLS certificate {} and key {}",
        cert_path.display(),
        key_path.display()
    );
    Ok(acceptor)
}

/// Builds a TLS acceptor from in-memory PEM data.
pub fn server_acceptor_from_pem(
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<TlsAcceptor, TransportError> {
    let certs = parse_certificates(cert_pem)?;

    let private_key: PrivateKeyDer<'static> =
        rustls_pemfile::private_key(&mut BufReader::new(key_pem))
            .map_err(|e| TransportError::PrivateKey(e.to_string()))?
            .ok_or_else(|| TransportError::PrivateKey("no private key found".into()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, private_key)
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Builds the client-side connector.
///
/// With a CA file the server certificate is verified against it. Without
/// one any certificate is accepted, which suits self-signed test servers.
pub fn client_connector(ca_path: Option<&Path>) -> Result<TlsConnector, TransportError> {
    match ca_path {
        Some(path) => {
            let pem = fs::read(path).map_err(|e| {
                TransportError::Certificate(format!("cannot read {}: {}", path.display(), e))
            })?;
            client_connector_from_pem(&pem)
        }
        None => {
            warn!("No CA certificate configured; server certificates will not be verified");
            let config = ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth();
            Ok(TlsConnector::from(Arc::new(config)))
        }
    }
}

/// Builds a connector trusting only the certificates in `ca_pem`.
pub fn client_connector_from_pem(ca_pem: &[u8]) -> Result<TlsConnector, TransportError> {
    let mut roots = RootCertStore::empty();
    for cert in parse_certificates(ca_pem)? {
        roots
            .add(cert)
            .map_err(|e| TransportError::Certificate(e.to_string()))?;
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Converts a host name or IP literal into a TLS server name.
pub fn server_name(host: &str) -> Result<ServerName<'static>, TransportError> {
    ServerName::try_from(host.to_string())
        .map_err(|_| TransportError::InvalidServerName(host.to_string()))
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Certificate(e.to_string()))?;

    if certs.is_empty() {
        return Err(TransportError::Certificate("no certificates found".into()));
    }
    Ok(certs)
}

/// Accepts any server certificate.
#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn rejects_pem_without_certificates() {
        let cert = testing::self_signed();
        assert!(matches!(
            server_acceptor_from_pem(b"", cert.key_pem.as_bytes()),
            Err(TransportError::Certificate(_))
        ));
        assert!(matches!(
            server_acceptor_from_pem(cert.cert_pem.as_bytes(), b""),
            Err(TransportError::PrivateKey(_))
        ));
    }

    #[test]
    fn connector_trusts_a_pem_bundle() {
        let cert = testing::self_signed();
        assert!(client_connector_from_pem(cert.cert_pem.as_bytes()).is_ok());
        assert!(client_connector_from_pem(b"garbage").is_err());
    }

    #[test]
    fn missing_files_are_reported() {
        let result = load_server_acceptor(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key"),
        );
        assert!(matches!(result, Err(TransportError::Certificate(_))));
    }

    #[test]
    fn server_names_accept_hosts_and_ips() {
        assert!(server_name("localhost").is_ok());
        assert!(server_name("127.0.0.1").is_ok());
        assert!(server_name("not a host").is_err());
    }

    #[tokio::test]
    async fn handshake_over_an_in_memory_pipe() {
        let (acceptor, connector) = testing::acceptor_and_connector();
        let (client_io, server_io) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move {
            let mut tls = acceptor.accept(server_io).await.unwrap();
            let mut buf = [0u8; 5];
            tls.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut tls = connector
            .connect(server_name("localhost").unwrap(), client_io)
            .await
            .unwrap();
        tls.write_all(b"hello").await.unwrap();
        tls.flush().await.unwrap();

        assert_eq!(&server.await.unwrap(), b"hello");
    }
}
