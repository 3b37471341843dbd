//! Client module
//!
//! An async FTPS client speaking the server's command subset.

pub mod connection;
pub mod results;

pub use connection::FtpClient;
pub use results::TransferOutcome;
