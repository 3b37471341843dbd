//! FTP Command parsing
//!
//! Splits one line of client input into a [`CommandLine`].

use crate::error::ProtocolError;
use crate::protocol::CommandLine;

/// Parses a raw command string received from a client.
///
/// The verb is upper-cased; recognising it is left to the dispatcher so that
/// unauthenticated sessions get 530 rather than 500 for unknown verbs.
pub fn parse_command(raw: &str) -> Result<CommandLine, ProtocolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let argument = parts.next().unwrap_or("").trim().to_string();
    let args = argument.split_whitespace().map(str::to_string).collect();

    Ok(CommandLine {
        verb,
        args,
        argument,
    })
}
