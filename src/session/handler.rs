use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TransportError;
use crate::protocol::responses::{READY, SYNTAX_ERROR};
use crate::protocol::{CommandStatus, Reply, handle_command};
use crate::server::ServerContext;
use crate::session::Session;
use crate::transport::ControlConnection;

/// Runs one control connection from greeting to QUIT or disconnect.
///
/// - Sends the 220 greeting.
/// - Reads one line at a time and dispatches it with `handle_command`.
/// - Overlong lines get a 500 and the loop continues.
pub async fn handle_session<S>(
    stream: S,
    peer_addr: SocketAddr,
    ctx: &ServerContext,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = ControlConnection::new(stream, ctx.max_command_length);
    let mut session = Session::new(peer_addr);

    conn.send(&Reply::new(READY, "FTP Server Ready")).await?;

    loop {
        let line = match conn.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Connection closed by client {}", peer_addr);
                return Ok(());
            }
            Err(TransportError::LineTooLong(max)) => {
                warn!("Client {} sent a line over {} bytes", peer_addr, max);
                conn.send(&Reply::new(SYNTAX_ERROR, "Command line too long"))
                    .await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        match handle_command(&mut session, &line, ctx, &mut conn).await? {
            CommandStatus::Continue => {}
            CommandStatus::CloseConnection => {
                info!("Client {} requested to quit", peer_addr);
                if let Err(e) = conn.shutdown().await {
                    debug!("Closing control connection to {}: {}", peer_addr, e);
                }
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    use crate::auth::StaticCredentials;
    use crate::storage::FileStore;
    use crate::transport::tls::testing;

    fn context(root: &TempDir) -> ServerContext {
        let (acceptor, _) = testing::acceptor_and_connector();
        ServerContext {
            credentials: Arc::new(StaticCredentials::default()),
            store: FileStore::open(root.path()).unwrap(),
            acceptor,
            bind_ip: "127.0.0.1".parse().unwrap(),
            passive_ip: "127.0.0.1".parse().unwrap(),
            data_accept_timeout: Duration::from_secs(1),
            buffer_size: 1024,
            max_command_length: 32,
            max_clients: 10,
            upload_dir: "Uploads".to_string(),
        }
    }

    #[tokio::test]
    async fn greets_serves_and_quits() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let (client, server) = duplex(8192);
        let peer = "127.0.0.1:5000".parse().unwrap();
        let task = tokio::spawn(async move { handle_session(server, peer, &ctx).await });

        let (read, mut write) = tokio::io::split(client);
        let mut lines = BufReader::new(read).lines();
        write
            .write_all(b"USER admin\r\nPASS admin123\r\nPWD\r\nQUIT\r\n")
            .await
            .unwrap();

        let mut codes = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            codes.push(Reply::parse(&line).unwrap().code);
        }
        assert_eq!(codes, vec![220, 331, 230, 257, 221]);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn overlong_lines_do_not_end_the_session() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let (client, server) = duplex(8192);
        let peer = "127.0.0.1:5001".parse().unwrap();
        let task = tokio::spawn(async move { handle_session(server, peer, &ctx).await });

        let (read, mut write) = tokio::io::split(client);
        let mut lines = BufReader::new(read).lines();
        let long = format!("USER {}\r\nQUIT\r\n", "a".repeat(200));
        write.write_all(long.as_bytes()).await.unwrap();

        assert!(lines.next_line().await.unwrap().unwrap().starts_with("220"));
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "500 Command line too long"
        );
        assert!(lines.next_line().await.unwrap().unwrap().starts_with("221"));
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn disconnect_ends_the_session_cleanly() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let (client, server) = duplex(8192);
        let peer = "127.0.0.1:5002".parse().unwrap();
        let task = tokio::spawn(async move { handle_session(server, peer, &ctx).await });

        let mut reader = BufReader::new(client);
        let mut greeting = String::new();
        reader.read_line(&mut greeting).await.unwrap();
        assert_eq!(greeting, "220 FTP Server Ready\r\n");
        drop(reader);

        task.await.unwrap().unwrap();
    }
}
