//! Error handlers
//!
//! Converts every domain error into the single reply the client receives.

use crate::error::types::{
    AuthError, NavigateError, ProtocolError, StorageError, TransferError,
};
use crate::protocol::Reply;
use crate::protocol::responses::{
    CANNOT_OPEN_DATA_CONNECTION, FILE_UNAVAILABLE, NOT_LOGGED_IN, PARAMETER_ERROR, SYNTAX_ERROR,
    TRANSFER_ABORTED,
};

/// Maps an error onto its FTP reply.
pub trait ToReply {
    fn to_reply(&self) -> Reply;
}

impl ToReply for AuthError {
    fn to_reply(&self) -> Reply {
        match self {
            AuthError::UnknownUser(_) => {
                Reply::new(NOT_LOGGED_IN, "Invalid username. Please try again.")
            }
            AuthError::InvalidPassword(_) => {
                Reply::new(NOT_LOGGED_IN, "Invalid password. Please try again.")
            }
            AuthError::MalformedInput(_) => {
                Reply::new(PARAMETER_ERROR, "Syntax error in parameters or arguments.")
            }
            AuthError::NoPendingUser => {
                Reply::new(NOT_LOGGED_IN, "Please enter a valid username first.")
            }
        }
    }
}

impl ToReply for StorageError {
    fn to_reply(&self) -> Reply {
        let text = match self {
            StorageError::FileNotFound(_) => "File not found.".to_string(),
            StorageError::DirectoryNotFound(_) => "Directory not found.".to_string(),
            StorageError::NotAFile(_) => "Not a regular file.".to_string(),
            StorageError::NotADirectory(_) => "Not a directory.".to_string(),
            StorageError::AlreadyExists(_) => "File or directory already exists.".to_string(),
            StorageError::PathTraversal(_) => "Path is outside the server root.".to_string(),
            StorageError::InvalidPath(_) => "Invalid path.".to_string(),
            StorageError::RootRemoval => "Cannot remove the root directory.".to_string(),
            StorageError::Io(e) => format!("Access denied: {e}"),
        };
        Reply::new(FILE_UNAVAILABLE, text)
    }
}

impl ToReply for NavigateError {
    fn to_reply(&self) -> Reply {
        let text = match self {
            NavigateError::DirectoryNotFound(_) | NavigateError::NotADirectory(_) => {
                "Directory does not exist or is not accessible.".to_string()
            }
            NavigateError::AlreadyAtRoot => "Already at root directory.".to_string(),
            NavigateError::PathTraversal(_) => "Path is outside the server root.".to_string(),
            NavigateError::InvalidPath(_) => "Invalid path.".to_string(),
            NavigateError::Io(e) => format!("Error: {e}"),
        };
        Reply::new(FILE_UNAVAILABLE, text)
    }
}

impl ToReply for TransferError {
    fn to_reply(&self) -> Reply {
        match self {
            TransferError::Io(_) => {
                Reply::new(TRANSFER_ABORTED, "Connection closed; transfer aborted.")
            }
            _ => Reply::new(CANNOT_OPEN_DATA_CONNECTION, "Can't open data connection."),
        }
    }
}

impl ToReply for ProtocolError {
    fn to_reply(&self) -> Reply {
        match self {
            ProtocolError::Empty | ProtocolError::UnknownCommand(_) => {
                Reply::new(SYNTAX_ERROR, "Syntax error, command unrecognized.")
            }
            ProtocolError::MissingArgument(_) | ProtocolError::TooManyArguments(_) => {
                Reply::new(PARAMETER_ERROR, "Syntax error in parameters or arguments.")
            }
        }
    }
}
