//! Storage operations
//!
//! `FileStore` performs every filesystem access made on behalf of a
//! session. All mutations (store, delete, make-directory, remove-directory)
//! hold the write side of one server-wide lock; reads hold the read side.
//! The lock serializes every writer in the server, which caps upload
//! throughput at one file at a time.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::fs::{self, File};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::error::StorageError;
use crate::storage::filesystem::entry_info;
use crate::storage::results::{EntryInfo, ResolvedPath};
use crate::storage::validation::{
    ensure_within_root, is_plain_file_name, resolve_virtual_path, virtual_to_real_path,
};

/// Filesystem access rooted at one directory, shared by all sessions.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
    lock: Arc<RwLock<()>>,
}

/// An open file for RETR. Mutations wait until it is dropped.
pub struct FileReader {
    file: File,
    _guard: OwnedRwLockReadGuard<()>,
}

impl FileReader {
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

/// A file being written by STOR. Holds the mutation lock until dropped.
pub struct FileWriter {
    file: File,
    _guard: OwnedRwLockWriteGuard<()>,
}

impl FileWriter {
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

impl FileStore {
    /// Opens the store, creating the root directory when missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root)?;
        info!("Server root directory: {}", canonical.display());

        Ok(Self {
            root: Arc::new(canonical),
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// Canonical server root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `target` against `current_dir` and checks containment.
    ///
    /// The deepest existing ancestor of the result is canonicalized, so a
    /// symlink leading out of the root is rejected even when the final
    /// component does not exist yet.
    pub async fn resolve(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<ResolvedPath, StorageError> {
        let virtual_path = resolve_virtual_path(current_dir, target)?;
        let real_path = virtual_to_real_path(&self.root, &virtual_path);
        self.check_contained(&real_path, &virtual_path).await?;
        Ok(ResolvedPath {
            virtual_path,
            real_path,
        })
    }

    async fn check_contained(
        &self,
        real_path: &Path,
        virtual_path: &str,
    ) -> Result<(), StorageError> {
        let mut candidate = real_path;
        loop {
            match fs::symlink_metadata(candidate).await {
                Ok(_) => {
                    ensure_within_root(&self.root, candidate, virtual_path)
                        .await
                        .inspect_err(|e| warn!("Rejected path {virtual_path}: {e}"))?;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    candidate = match candidate.parent() {
                        Some(parent) if parent.starts_with(self.root.as_path()) => parent,
                        _ => return Err(StorageError::PathTraversal(virtual_path.to_string())),
                    };
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolves `target` and requires it to be an existing directory.
    pub async fn find_directory(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<ResolvedPath, StorageError> {
        let path = self.resolve(current_dir, target).await?;
        match fs::metadata(&path.real_path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(StorageError::NotADirectory(path.virtual_path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::DirectoryNotFound(path.virtual_path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists a directory (the session directory when `target` is `None`),
    /// sorted by name.
    pub async fn list_directory(
        &self,
        current_dir: &str,
        target: Option<&str>,
    ) -> Result<Vec<EntryInfo>, StorageError> {
        let _guard = self.lock.read().await;
        let dir = self.find_directory(current_dir, target.unwrap_or(".")).await?;

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir.real_path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            match entry_info(&entry.path()).await {
                Ok(info) => entries.push(info),
                Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            "Listed directory {} (real: {}) - {} entries",
            dir.virtual_path,
            dir.real_path.display(),
            entries.len()
        );
        Ok(entries)
    }

    /// Checks that `target` names an existing regular file.
    pub async fn prepare_retrieval(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<ResolvedPath, StorageError> {
        let path = self.resolve(current_dir, target).await?;
        match fs::metadata(&path.real_path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotAFile(path.virtual_path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::FileNotFound(path.virtual_path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Opens a prepared file for reading, holding the read lock.
    pub async fn open_reader(&self, path: &ResolvedPath) -> Result<FileReader, StorageError> {
        let guard = Arc::clone(&self.lock).read_owned().await;
        let file = File::open(&path.real_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::FileNotFound(path.virtual_path.clone()),
            _ => StorageError::Io(e),
        })?;
        Ok(FileReader {
            file,
            _guard: guard,
        })
    }

    /// Resolves the destination of an upload: `filename` inside `dest_dir`.
    ///
    /// `dest_dir` may not exist yet; it is created by [`FileStore::open_writer`].
    pub async fn prepare_storage(
        &self,
        current_dir: &str,
        filename: &str,
        dest_dir: &str,
    ) -> Result<ResolvedPath, StorageError> {
        if !is_plain_file_name(filename) {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }

        let dir = self.resolve(current_dir, dest_dir).await?;
        match fs::metadata(&dir.real_path).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(StorageError::NotADirectory(dir.virtual_path));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let path = self.resolve(&dir.virtual_path, filename).await?;
        if let Ok(meta) = fs::metadata(&path.real_path).await {
            if meta.is_dir() {
                return Err(StorageError::NotAFile(path.virtual_path));
            }
        }
        Ok(path)
    }

    /// Creates (or truncates) a prepared upload target, holding the write lock.
    ///
    /// Missing parent directories are created first.
    pub async fn open_writer(&self, path: &ResolvedPath) -> Result<FileWriter, StorageError> {
        let guard = Arc::clone(&self.lock).write_owned().await;
        if let Some(parent) = path.real_path.parent() {
            fs::create_dir_all(parent).await?;
            self.check_contained(parent, &path.virtual_path).await?;
        }
        let file = File::create(&path.real_path).await?;
        Ok(FileWriter {
            file,
            _guard: guard,
        })
    }

    /// Deletes a regular file.
    pub async fn delete_file(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<String, StorageError> {
        let _guard = self.lock.write().await;
        let path = self.prepare_retrieval(current_dir, target).await?;
        fs::remove_file(&path.real_path).await?;
        info!(
            "Deleted file {} (real: {})",
            path.virtual_path,
            path.real_path.display()
        );
        Ok(path.virtual_path)
    }

    /// Creates exactly one directory; its parent must exist.
    pub async fn make_directory(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<String, StorageError> {
        let _guard = self.lock.write().await;
        let path = self.resolve(current_dir, target).await?;
        if path.virtual_path == "/" {
            return Err(StorageError::AlreadyExists(path.virtual_path));
        }

        match fs::create_dir(&path.real_path).await {
            Ok(()) => {
                info!(
                    "Created directory {} (real: {})",
                    path.virtual_path,
                    path.real_path.display()
                );
                Ok(path.virtual_path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path.virtual_path))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::DirectoryNotFound(path.virtual_path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a directory and everything below it.
    pub async fn remove_directory(
        &self,
        current_dir: &str,
        target: &str,
    ) -> Result<String, StorageError> {
        let _guard = self.lock.write().await;
        let path = self.resolve(current_dir, target).await?;
        if path.virtual_path == "/" {
            return Err(StorageError::RootRemoval);
        }

        match fs::symlink_metadata(&path.real_path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StorageError::NotADirectory(path.virtual_path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::DirectoryNotFound(path.virtual_path));
            }
            Err(e) => return Err(e.into()),
        }

        fs::remove_dir_all(&path.real_path).await?;
        info!(
            "Removed directory {} (real: {})",
            path.virtual_path,
            path.real_path.display()
        );
        Ok(path.virtual_path)
    }
}
