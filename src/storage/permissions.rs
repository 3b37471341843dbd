//! File permissions
//!
//! Extracts the permission bits shown in directory listings.

use std::fs::Metadata;

/// Permission bits of `metadata` (`0o755` style).
#[cfg(unix)]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

/// Approximation for platforms without Unix modes: read-only or read-write.
#[cfg(not(unix))]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// Formats permission bits as three octal digits.
pub fn format_permissions(bits: u32) -> String {
    format!("{:03o}", bits & 0o777)
}
