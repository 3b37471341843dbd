#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use rcgen::{CertificateParams, KeyPair};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use rax_ftps_server::auth::StaticCredentials;
use rax_ftps_server::transport::{client_connector, server_acceptor_from_pem, server_name};
use rax_ftps_server::{FtpClient, Server, ServerConfig};

pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    task: JoinHandle<()>,
}

impl TestServer {
    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.root.path().join(relative)
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn start_server() -> TestServer {
    start_server_with(|_| {}).await
}

/// Starts a server on an ephemeral port with a fresh root and a
/// self-signed certificate.
pub async fn start_server_with(customize: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let root = TempDir::new().unwrap();

    let key_pair = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    let acceptor =
        server_acceptor_from_pem(cert.pem().as_bytes(), key_pair.serialize_pem().as_bytes())
            .unwrap();

    let mut config = ServerConfig {
        control_port: 0,
        server_root: root.path().to_string_lossy().into_owned(),
        data_accept_timeout_secs: 5,
        ..Default::default()
    };
    customize(&mut config);

    let server = Server::with_acceptor(&config, Arc::new(StaticCredentials::default()), acceptor)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let task = tokio::spawn(server.run());

    TestServer { addr, root, task }
}

pub async fn connect(server: &TestServer) -> FtpClient {
    FtpClient::connect(
        server.addr,
        client_connector(None).unwrap(),
        server_name("localhost").unwrap(),
    )
    .await
    .unwrap()
}

pub async fn login(server: &TestServer, username: &str, password: &str) -> FtpClient {
    let mut client = connect(server).await;
    let reply = client.login(username, password).await.unwrap();
    assert_eq!(reply.code, 230, "login as {username} failed: {reply}");
    client
}

/// Deterministic, non-repeating-looking test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32) as u8)
        .collect()
}
