//! Content blob storage
//!
//! Memories' full text lives in a content store addressed by logical path
//! (`memories/<category>/<date>-<slug>.md`). The filesystem implementation
//! maps logical paths onto a base directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{MembankError, Result};

/// Key→text blob storage addressed by logical, forward-slash paths.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a blob; `None` if the path does not exist.
    async fn read(&self, path: &str) -> Result<Option<String>>;

    /// Write a blob, creating any missing parents.
    async fn write(&self, path: &str, text: &str) -> Result<()>;

    /// Delete a blob; returns whether it existed.
    async fn delete(&self, path: &str) -> Result<bool>;

    /// All blob paths under a logical prefix, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Content store backed by a directory on the local filesystem.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a logical path onto the base directory. Empty, `.`, and `..`
    /// segments are dropped so a record can never escape the root.
    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/') {
            if !part.is_empty() && part != "." && part != ".." {
                full.push(part);
            }
        }
        full
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn read(&self, path: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.resolve(path)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MembankError::Storage(format!("Failed to read {path}: {e}"))),
        }
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                MembankError::Storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        fs::write(&full, text)
            .await
            .map_err(|e| MembankError::Storage(format!("Failed to write {path}: {e}")))
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        match fs::remove_file(self.resolve(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MembankError::Storage(format!(
                "Failed to delete {path}: {e}"
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let base = self.resolve(prefix);
        match fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) | Err(_) => return Ok(Vec::new()),
        }

        let mut files = Vec::new();
        let mut pending = vec![base];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                MembankError::Storage(format!("Failed to list {}: {e}", dir.display()))
            })?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                MembankError::Storage(format!("Failed to list {}: {e}", dir.display()))
            })? {
                let file_type = entry.file_type().await.map_err(|e| {
                    MembankError::Storage(format!("Failed to stat {:?}: {e}", entry.path()))
                })?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                        let logical: Vec<String> = rel
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect();
                        files.push(logical.join("/"));
                    }
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
