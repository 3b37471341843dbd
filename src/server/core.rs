use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tokio_rustls::TlsAcceptor;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::error::{ServerError, TransportError};
use crate::protocol::Reply;
use crate::protocol::responses::SERVICE_UNAVAILABLE;
use crate::server::ServerContext;
use crate::session::handle_session;
use crate::transport::{ControlConnection, load_server_acceptor};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    sessions: Arc<Semaphore>,
}

impl Server {
    /// Loads the TLS certificate named in `config` and binds the control port.
    pub async fn bind(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let acceptor =
            load_server_acceptor(Path::new(&config.cert_file), Path::new(&config.key_file))?;
        Self::with_acceptor(config, credentials, acceptor).await
    }

    /// Binds the control port using an already built TLS acceptor.
    ///
    /// `config` is used as given; a control port of 0 binds an ephemeral port.
    pub async fn with_acceptor(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialStore>,
        acceptor: TlsAcceptor,
    ) -> Result<Self, ServerError> {
        let ctx = ServerContext::from_config(config, credentials, acceptor)?;

        let socket = config.control_socket()?;
        let listener = TcpListener::bind(socket)
            .await
            .inspect_err(|e| error!("Failed to bind to {}: {}", socket, e))?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            sessions: Arc::new(Semaphore::new(ctx.max_clients)),
            ctx: Arc::new(ctx),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts control connections forever, one task per connection.
    pub async fn run(self) {
        info!(
            "Starting RAX FTPS server on {} (max {} clients)",
            self.local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".into()),
            self.ctx.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let ctx = Arc::clone(&self.ctx);
                    let sessions = Arc::clone(&self.sessions);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, addr, ctx, sessions).await {
                            warn!("Session with {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => accept_failed(&e).await,
            }
        }
    }
}

/// Logs a failed accept and pauses before the next one.
///
/// Persistent failures such as EMFILE would otherwise spin the loop.
async fn accept_failed(e: &io::Error) {
    error!("Error accepting connection: {}", e);
    sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Completes the TLS handshake, takes a session slot and runs the session.
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: Arc<ServerContext>,
    sessions: Arc<Semaphore>,
) -> Result<(), TransportError> {
    let tls = match timeout(ctx.data_accept_timeout, ctx.acceptor.accept(stream)).await {
        Ok(Ok(tls)) => tls,
        Ok(Err(e)) => {
            warn!("TLS handshake with {} failed: {}", addr, e);
            return Ok(());
        }
        Err(_) => {
            warn!("TLS handshake with {} timed out", addr);
            return Ok(());
        }
    };

    let Ok(_permit) = sessions.try_acquire_owned() else {
        warn!("Rejecting {}: server is at max clients", addr);
        let mut conn = ControlConnection::new(tls, ctx.max_command_length);
        conn.send(&Reply::new(SERVICE_UNAVAILABLE, "Too many connections"))
            .await?;
        conn.shutdown().await?;
        return Ok(());
    };

    info!("New client connected: {}", addr);
    handle_session(tls, addr, &ctx).await
}
