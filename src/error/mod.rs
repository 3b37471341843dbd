//! Error handling
//!
//! Defines error types and their conversion to FTP replies.

pub mod handlers;
pub mod types;

pub use handlers::ToReply;
pub use types::*;
