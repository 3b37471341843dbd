//! Module `data_channel`
//!
//! Passive-mode data channels. Each channel listens on an OS-assigned
//! port, accepts exactly one TLS connection within a bounded wait, and is
//! consumed by that accept so a descriptor is never reused.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::error::TransferError;
use crate::protocol::Reply;
use crate::protocol::responses::ENTERING_PASSIVE_MODE;

/// A listening passive endpoint waiting for its one client.
#[derive(Debug)]
pub struct PassiveDataChannel {
    listener: TcpListener,
    announce: Ipv4Addr,
    port: u16,
}

/// The accepted, TLS-wrapped data connection.
pub struct DataConnection {
    stream: TlsStream<TcpStream>,
    peer: SocketAddr,
}

impl PassiveDataChannel {
    /// Binds an ephemeral port on `bind_ip`. `announce` is the address put
    /// in the 227 reply and must be IPv4.
    pub async fn open(bind_ip: IpAddr, announce: IpAddr) -> Result<Self, TransferError> {
        let announce = match announce {
            IpAddr::V4(v4) => v4,
            other => return Err(TransferError::NotIpv4(other)),
        };

        let listener = TcpListener::bind((bind_ip, 0))
            .await
            .map_err(|e| TransferError::Bind(bind_ip, e))?;
        let port = listener
            .local_addr()
            .map_err(|e| TransferError::Bind(bind_ip, e))?
            .port();

        debug!("Passive listener bound on {bind_ip}:{port}");
        Ok(Self {
            listener,
            announce,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` announcement.
    pub fn passive_reply(&self) -> Reply {
        Reply::new(
            ENTERING_PASSIVE_MODE,
            format!(
                "Entering Passive Mode ({})",
                encode_pasv(self.announce, self.port)
            ),
        )
    }

    /// Waits up to `wait` for one client and completes the TLS handshake.
    ///
    /// When `expected_peer` is set, connections from other addresses are
    /// dropped and waiting continues. The listener is closed when this
    /// returns, whatever the outcome.
    pub async fn accept(
        self,
        acceptor: &TlsAcceptor,
        expected_peer: Option<IpAddr>,
        wait: Duration,
    ) -> Result<DataConnection, TransferError> {
        let port = self.port;
        match timeout(wait, self.accept_one(acceptor, expected_peer)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("No data connection on port {port} within {wait:?}");
                Err(TransferError::Timeout { port, waited: wait })
            }
        }
    }

    async fn accept_one(
        &self,
        acceptor: &TlsAcceptor,
        expected_peer: Option<IpAddr>,
    ) -> Result<DataConnection, TransferError> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(TransferError::Accept)?;

            if let Some(expected) = expected_peer {
                if peer.ip() != expected {
                    warn!(
                        "Rejected data connection from {peer} on port {}; expected {expected}",
                        self.port
                    );
                    continue;
                }
            }

            let stream = acceptor
                .accept(stream)
                .await
                .map_err(|e| TransferError::Handshake(peer, e))?;
            info!("Data connection accepted from {peer} on port {}", self.port);
            return Ok(DataConnection { stream, peer });
        }
    }
}

impl DataConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream_mut(&mut self) -> &mut TlsStream<TcpStream> {
        &mut self.stream
    }

    /// Sends TLS close_notify and closes the socket.
    pub async fn finish(mut self) -> Result<(), TransferError> {
        self.stream.shutdown().await?;
        debug!("Data connection to {} closed", self.peer);
        Ok(())
    }
}

/// Encodes an address as `h1,h2,h3,h4,p1,p2` with `port = p1*256 + p2`.
pub fn encode_pasv(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!("{},{},{},{},{},{}", h1, h2, h3, h4, port >> 8, port & 0xff)
}

/// Extracts the endpoint from a 227 reply text.
pub fn decode_pasv(text: &str) -> Option<SocketAddrV4> {
    let start = text.find('(')?;
    let end = text[start..].find(')')? + start;
    let fields = text[start + 1..end]
        .split(',')
        .map(|field| field.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    match fields.as_slice() {
        [h1, h2, h3, h4, p1, p2] => Some(SocketAddrV4::new(
            Ipv4Addr::new(*h1, *h2, *h3, *h4),
            u16::from(*p1) * 256 + u16::from(*p2),
        )),
        _ => None,
    }
}
