//! Path validation
//!
//! Turns client-supplied paths into virtual paths (rooted at `/`, the
//! server root) and maps those onto the real filesystem. A `..` that would
//! climb above `/` is an error, never clamped.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Joins `target` onto `current_dir` and normalizes the result.
///
/// Absolute targets start from `/`; relative ones from `current_dir`.
/// Both `/` and `\` separate components.
pub fn resolve_virtual_path(current_dir: &str, target: &str) -> Result<String, StorageError> {
    if target.contains('\0') {
        return Err(StorageError::InvalidPath(target.to_string()));
    }

    let base = if target.starts_with(['/', '\\']) {
        "/"
    } else {
        current_dir
    };

    let mut components: Vec<&str> = Vec::new();
    for part in base.split(['/', '\\']).chain(target.split(['/', '\\'])) {
        match part {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(StorageError::PathTraversal(target.to_string()));
                }
            }
            name => components.push(name),
        }
    }

    Ok(format!("/{}", components.join("/")))
}

/// Maps a normalized virtual path onto the real filesystem under `root`.
pub fn virtual_to_real_path(root: &Path, virtual_path: &str) -> PathBuf {
    let mut real = root.to_path_buf();
    for part in virtual_path.split('/').filter(|p| !p.is_empty()) {
        real.push(part);
    }
    real
}

/// Parent of a normalized virtual path, or `None` at `/`.
pub fn parent_virtual_path(virtual_path: &str) -> Option<String> {
    if virtual_path == "/" {
        return None;
    }
    let trimmed = virtual_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(trimmed[..idx].to_string()),
        None => Some("/".to_string()),
    }
}

/// Whether `name` is usable as a single path component for an upload.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\', '\0'])
}

/// Canonicalizes `real_path` and checks it is still inside `canonical_root`.
///
/// Used on existing paths so that symlinks pointing outside the root are
/// rejected too.
pub async fn ensure_within_root(
    canonical_root: &Path,
    real_path: &Path,
    virtual_path: &str,
) -> Result<PathBuf, StorageError> {
    let canonical = tokio::fs::canonicalize(real_path).await?;
    if canonical.starts_with(canonical_root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversal(virtual_path.to_string()))
    }
}
