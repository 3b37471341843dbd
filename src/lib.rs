//! RAX FTPS Server
//!
//! An FTP server over TLS with role-based command authorization,
//! per-session working directories and passive-mode data channels.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod transport;

pub use client::FtpClient;
pub use config::ServerConfig;
pub use server::Server;
