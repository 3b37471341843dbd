//! File system operations
//!
//! Metadata helpers used to describe directory entries.

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use crate::storage::permissions::permission_bits;
use crate::storage::results::EntryInfo;

/// Creation time, falling back to modification time where the platform
/// or filesystem does not record creation.
pub fn created_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Reads the listing metadata of one directory entry.
pub async fn entry_info(path: &Path) -> std::io::Result<EntryInfo> {
    let metadata = tokio::fs::metadata(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(EntryInfo {
        name,
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        permissions: permission_bits(&metadata),
        created: created_time(&metadata),
    })
}
