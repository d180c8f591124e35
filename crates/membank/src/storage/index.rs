//! Index document storage
//!
//! The index is one JSON document holding every IndexEntry. The filesystem
//! implementation keeps it at `<data_dir>/index.json`; a missing file reads
//! as an empty index.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{MembankError, Result};
use crate::memory::MemoryIndex;

/// Load/save access to the single index document.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn read(&self) -> Result<MemoryIndex>;
    async fn write(&self, index: &MemoryIndex) -> Result<()>;
}

/// Index store backed by a pretty-printed JSON file.
pub struct FsIndexStore {
    path: PathBuf,
}

impl FsIndexStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("index.json"),
        }
    }
}

#[async_trait]
impl IndexStore for FsIndexStore {
    async fn read(&self) -> Result<MemoryIndex> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MemoryIndex::new());
            }
            Err(e) => {
                return Err(MembankError::Index(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            MembankError::Index(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }

    async fn write(&self, index: &MemoryIndex) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                MembankError::Index(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let json = serde_json::to_string_pretty(index)
            .map_err(|e| MembankError::Index(format!("Failed to serialize index: {e}")))?;
        fs::write(&self.path, json).await.map_err(|e| {
            MembankError::Index(format!("Failed to write {}: {e}", self.path.display()))
        })
    }
}
