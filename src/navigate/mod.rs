//! Navigation module
//!
//! Working directory changes for CWD and CDUP.

pub mod operations;

pub use operations::{change_directory, change_to_parent};
