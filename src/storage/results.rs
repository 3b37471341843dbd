//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::storage::permissions::format_permissions;

/// A client path after resolution against the session directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Normalized path as the client sees it, rooted at `/`.
    pub virtual_path: String,
    /// Location on disk under the server root.
    pub real_path: PathBuf,
}

/// One line of a directory listing.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub permissions: u32,
    pub created: SystemTime,
}

impl EntryInfo {
    pub fn format_line(&self) -> String {
        let created: DateTime<Local> = self.created.into();
        format!(
            "{}\t\t{} bytes\t\tPermissions: {}\t\tCreated: {}",
            self.name,
            self.size,
            format_permissions(self.permissions),
            created.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Renders the bytes sent over the data channel for LIST.
pub fn render_listing(entries: &[EntryInfo]) -> String {
    if entries.is_empty() {
        return "No files found.\r\n".to_string();
    }
    entries
        .iter()
        .map(EntryInfo::format_line)
        .collect::<Vec<_>>()
        .join("\r\n")
}
