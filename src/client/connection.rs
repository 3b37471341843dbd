//! FTPS client
//!
//! A small client for the server's command subset, used by the
//! integration tests and usable as a library. Transfers follow the
//! 227 / 150 / 226 sequence over a TLS data connection.

use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;

use crate::client::TransferOutcome;
use crate::error::ClientError;
use crate::protocol::Reply;
use crate::protocol::responses::{DATA_CONNECTION_OPENING, ENTERING_PASSIVE_MODE};
use crate::transfer::decode_pasv;
use crate::transport::ControlConnection;

const MAX_REPLY_LENGTH: usize = 8192;

pub struct FtpClient {
    control: ControlConnection<TlsStream<TcpStream>>,
    connector: TlsConnector,
    server_name: ServerName<'static>,
    greeting: Reply,
}

impl FtpClient {
    /// Connects, completes the TLS handshake and reads the greeting.
    ///
    /// `server_name` is also used for every data connection.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        connector: TlsConnector,
        server_name: ServerName<'static>,
    ) -> Result<Self, ClientError> {
        let tcp = TcpStream::connect(addr).await?;
        let tls = connector.connect(server_name.clone(), tcp).await?;
        let mut control = ControlConnection::new(tls, MAX_REPLY_LENGTH);
        let greeting = read_reply(&mut control).await?;

        Ok(Self {
            control,
            connector,
            server_name,
            greeting,
        })
    }

    pub fn greeting(&self) -> &Reply {
        &self.greeting
    }

    /// Sends one raw command line and reads the reply.
    pub async fn command(&mut self, line: &str) -> Result<Reply, ClientError> {
        debug!("-> {}", line);
        self.control.send_raw(&format!("{line}\r\n")).await?;
        self.read_reply().await
    }

    pub async fn read_reply(&mut self) -> Result<Reply, ClientError> {
        read_reply(&mut self.control).await
    }

    /// USER then PASS. Stops after USER if it was not answered with 331.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Reply, ClientError> {
        let reply = self.command(&format!("USER {username}")).await?;
        if !reply.needs_more_input() {
            return Ok(reply);
        }
        self.command(&format!("PASS {password}")).await
    }

    pub async fn pwd(&mut self) -> Result<Reply, ClientError> {
        self.command("PWD").await
    }

    pub async fn cwd(&mut self, path: &str) -> Result<Reply, ClientError> {
        self.command(&format!("CWD {path}")).await
    }

    pub async fn cdup(&mut self) -> Result<Reply, ClientError> {
        self.command("CDUP").await
    }

    pub async fn mkd(&mut self, path: &str) -> Result<Reply, ClientError> {
        self.command(&format!("MKD {path}")).await
    }

    pub async fn rmd(&mut self, path: &str) -> Result<Reply, ClientError> {
        self.command(&format!("RMD {path}")).await
    }

    pub async fn dele(&mut self, path: &str) -> Result<Reply, ClientError> {
        self.command(&format!("DELE {path}")).await
    }

    pub async fn quit(mut self) -> Result<Reply, ClientError> {
        self.command("QUIT").await
    }

    pub async fn list(&mut self, path: Option<&str>) -> Result<TransferOutcome, ClientError> {
        let line = match path {
            Some(path) => format!("LIST {path}"),
            None => "LIST".to_string(),
        };
        self.transfer(&line, None).await
    }

    pub async fn retrieve(&mut self, path: &str) -> Result<TransferOutcome, ClientError> {
        self.transfer(&format!("RETR {path}"), None).await
    }

    /// Uploads `contents` as `filename`, into `dest_dir` when given.
    pub async fn store(
        &mut self,
        filename: &str,
        dest_dir: Option<&str>,
        contents: &[u8],
    ) -> Result<TransferOutcome, ClientError> {
        let line = match dest_dir {
            Some(dir) => format!("STOR {filename} {dir}"),
            None => format!("STOR {filename}"),
        };
        self.transfer(&line, Some(contents)).await
    }

    /// Runs one transfer command. Stops at the first reply that is not the
    /// expected 227 or 150 and returns the replies seen so far.
    async fn transfer(
        &mut self,
        line: &str,
        upload: Option<&[u8]>,
    ) -> Result<TransferOutcome, ClientError> {
        let mut outcome = TransferOutcome::default();

        let passive = self.command(line).await?;
        if passive.code != ENTERING_PASSIVE_MODE {
            outcome.replies.push(passive);
            return Ok(outcome);
        }
        let Some(addr) = decode_pasv(&passive.text) else {
            return Err(ClientError::BadPassiveReply(passive));
        };
        outcome.replies.push(passive);

        let tcp = TcpStream::connect(addr).await?;
        let mut data = self.connector.connect(self.server_name.clone(), tcp).await?;

        let opening = self.read_reply().await?;
        let opened = opening.code == DATA_CONNECTION_OPENING;
        outcome.replies.push(opening);
        if !opened {
            return Ok(outcome);
        }

        match upload {
            Some(bytes) => {
                data.write_all(bytes).await?;
                data.shutdown().await?;
            }
            None => {
                data.read_to_end(&mut outcome.data).await?;
            }
        }

        // The data stream stays open until the final reply so the server
        // reads the whole upload before the socket goes away.
        outcome.replies.push(self.read_reply().await?);
        drop(data);
        Ok(outcome)
    }
}

async fn read_reply(
    control: &mut ControlConnection<TlsStream<TcpStream>>,
) -> Result<Reply, ClientError> {
    match control.read_line().await? {
        Some(line) => {
            debug!("<- {}", line);
            Reply::parse(&line).ok_or(ClientError::MalformedReply(line))
        }
        None => Err(ClientError::Closed),
    }
}
