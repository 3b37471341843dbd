//! FTP Protocol implementation
//!
//! Handles FTP command parsing, validation, and response generation.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{Command, CommandLine, Verb};
pub use handlers::{CommandStatus, handle_command};
pub use parser::parse_command;
pub use responses::Reply;
