//! Shared server state handed to every session.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::TlsAcceptor;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::storage::FileStore;

/// Read-only state shared by all sessions. The only mutable piece is the
/// mutation lock inside [`FileStore`].
#[derive(Clone)]
pub struct ServerContext {
    pub credentials: Arc<dyn CredentialStore>,
    pub store: FileStore,
    pub acceptor: TlsAcceptor,
    pub bind_ip: IpAddr,
    pub passive_ip: IpAddr,
    pub data_accept_timeout: Duration,
    pub buffer_size: usize,
    pub max_command_length: usize,
    pub max_clients: usize,
    pub upload_dir: String,
}

impl ServerContext {
    /// Opens the server root and collects the settings sessions need.
    pub fn from_config(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialStore>,
        acceptor: TlsAcceptor,
    ) -> Result<Self, ServerError> {
        let store = FileStore::open(config.server_root_path())?;
        Ok(Self {
            credentials,
            store,
            acceptor,
            bind_ip: config.control_socket()?.ip(),
            passive_ip: config.passive_ip()?,
            data_accept_timeout: config.data_accept_timeout(),
            buffer_size: config.buffer_size,
            max_command_length: config.max_command_length,
            max_clients: config.max_clients,
            upload_dir: config.upload_dir.clone(),
        })
    }
}
