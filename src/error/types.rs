//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::protocol::Reply;

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("invalid password for user: {0}")]
    InvalidPassword(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("PASS received without a preceding USER")]
    NoPendingUser,
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("not a regular file: {0}")]
    NotAFile(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("path escapes the server root: {0}")]
    PathTraversal(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("the server root cannot be removed")]
    RootRemoval,
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Navigate module errors
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("already at root directory")]
    AlreadyAtRoot,
    #[error("path escapes the server root: {0}")]
    PathTraversal(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("{0}")]
    Io(io::Error),
}

impl From<StorageError> for NavigateError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::FileNotFound(p) | StorageError::DirectoryNotFound(p) => {
                NavigateError::DirectoryNotFound(p)
            }
            StorageError::NotAFile(p) | StorageError::NotADirectory(p) => {
                NavigateError::NotADirectory(p)
            }
            StorageError::PathTraversal(p) => NavigateError::PathTraversal(p),
            StorageError::InvalidPath(p) | StorageError::AlreadyExists(p) => {
                NavigateError::InvalidPath(p)
            }
            StorageError::RootRemoval => NavigateError::InvalidPath("/".into()),
            StorageError::Io(e) => NavigateError::Io(e),
        }
    }
}

/// Passive data channel errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to bind data listener on {0}: {1}")]
    Bind(IpAddr, io::Error),
    #[error("passive mode requires an IPv4 address, got {0}")]
    NotIpv4(IpAddr),
    #[error("no data connection on port {port} within {waited:?}")]
    Timeout { port: u16, waited: Duration },
    #[error("failed to accept data connection: {0}")]
    Accept(io::Error),
    #[error("data channel TLS handshake with {0} failed: {1}")]
    Handshake(SocketAddr, io::Error),
    #[error("transfer failed: {0}")]
    Io(#[from] io::Error),
}

/// Control/data transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("command line exceeds {0} bytes")]
    LineTooLong(usize),
    #[error("certificate error: {0}")]
    Certificate(String),
    #[error("private key error: {0}")]
    PrivateKey(String),
    #[error("TLS configuration error: {0}")]
    Tls(String),
    #[error("invalid server name: {0}")]
    InvalidServerName(String),
}

/// Malformed or unrecognised command lines
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty command line")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0} requires an argument")]
    MissingArgument(&'static str),
    #[error("too many arguments for {0}")]
    TooManyArguments(&'static str),
}

/// Errors raised by the bundled FTPS client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("server closed the control connection")]
    Closed,
    #[error("unparsable reply: {0}")]
    MalformedReply(String),
    #[error("unparsable passive mode reply: {0}")]
    BadPassiveReply(Reply),
}

/// Startup errors for the whole server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
