//! Navigation operations implementation

use log::info;

use crate::error::NavigateError;
use crate::storage::FileStore;
use crate::storage::validation::parent_virtual_path;

/// Resolves the new working directory for CWD.
///
/// The target must be an existing directory inside the root. On error the
/// caller keeps its current directory.
pub async fn change_directory(
    store: &FileStore,
    current_dir: &str,
    target: &str,
) -> Result<String, NavigateError> {
    if target.trim().is_empty() {
        return Err(NavigateError::InvalidPath("Empty path provided".into()));
    }

    let dir = store.find_directory(current_dir, target).await?;
    info!("Changed directory {} -> {}", current_dir, dir.virtual_path);
    Ok(dir.virtual_path)
}

/// Resolves the parent of `current_dir` for CDUP.
pub async fn change_to_parent(
    store: &FileStore,
    current_dir: &str,
) -> Result<String, NavigateError> {
    let parent = parent_virtual_path(current_dir).ok_or(NavigateError::AlreadyAtRoot)?;
    let dir = store.find_directory("/", &parent).await?;
    Ok(dir.virtual_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/reports")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn cwd_moves_into_existing_directories() {
        let (_dir, store) = setup();
        assert_eq!(change_directory(&store, "/", "docs").await.unwrap(), "/docs");
        assert_eq!(
            change_directory(&store, "/docs", "reports").await.unwrap(),
            "/docs/reports"
        );
        assert_eq!(change_directory(&store, "/docs/reports", "/").await.unwrap(), "/");
    }

    #[tokio::test]
    async fn cwd_rejects_missing_files_and_escapes() {
        let (_dir, store) = setup();
        assert!(matches!(
            change_directory(&store, "/", "nowhere").await,
            Err(NavigateError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            change_directory(&store, "/", "notes.txt").await,
            Err(NavigateError::NotADirectory(_))
        ));
        assert!(matches!(
            change_directory(&store, "/", "../..").await,
            Err(NavigateError::PathTraversal(_))
        ));
        assert!(matches!(
            change_directory(&store, "/", "  ").await,
            Err(NavigateError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn cdup_climbs_one_level_and_stops_at_root() {
        let (_dir, store) = setup();
        assert_eq!(change_to_parent(&store, "/docs/reports").await.unwrap(), "/docs");
        assert_eq!(change_to_parent(&store, "/docs").await.unwrap(), "/");
        assert!(matches!(
            change_to_parent(&store, "/").await,
            Err(NavigateError::AlreadyAtRoot)
        ));
    }
}
