//! Server module
//!
//! The control-port accept loop and the state it shares with sessions.

pub mod context;
pub mod core;

pub use context::ServerContext;
pub use self::core::Server;
