//! Storage module
//!
//! Path resolution under the server root and the file operations
//! executed for LIST, RETR, STOR, DELE, MKD and RMD.

pub mod filesystem;
pub mod operations;
pub mod permissions;
pub mod results;
pub mod validation;

pub use operations::{FileReader, FileStore, FileWriter};
pub use results::{EntryInfo, ResolvedPath, render_listing};
