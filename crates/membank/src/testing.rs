//! Test utilities for membank - in-memory stores and fixtures
//!
//! This module provides doubles to keep tests fast and off the filesystem:
//! - In-memory content and index stores
//! - A project resolver pinned to a fixed answer
//! - Ready-made repositories wired from the above

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::memory::MemoryIndex;
use crate::project::{ProjectResolver, ProjectScope};
use crate::repository::MemoryRepository;
use crate::storage::{ContentStore, IndexStore};

/// Content store holding blobs in a map, keyed by logical path.
#[derive(Debug, Default)]
pub struct MemContentStore {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemContentStore {
    async fn read(&self, path: &str) -> Result<Option<String>> {
        Ok(self.blobs.lock().await.get(path).cloned())
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        self.blobs
            .lock()
            .await
            .insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        Ok(self.blobs.lock().await.remove(path).is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let blobs = self.blobs.lock().await;
        Ok(blobs
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Index store keeping the document in memory.
#[derive(Debug, Default)]
pub struct MemIndexStore {
    index: Mutex<Option<MemoryIndex>>,
}

impl MemIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemIndexStore {
    async fn read(&self) -> Result<MemoryIndex> {
        Ok(self.index.lock().await.clone().unwrap_or_default())
    }

    async fn write(&self, index: &MemoryIndex) -> Result<()> {
        *self.index.lock().await = Some(index.clone());
        Ok(())
    }
}

/// Resolver pinned to a fixed answer, independent of the environment.
#[derive(Debug, Clone, Default)]
pub struct FixedProjectResolver {
    scope: Option<ProjectScope>,
}

impl FixedProjectResolver {
    /// Resolver that never detects a project.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolver that always reports the given project.
    pub fn project(id: &str, name: &str) -> Self {
        Self {
            scope: Some(ProjectScope {
                id: id.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProjectResolver for FixedProjectResolver {
    async fn resolve(&self) -> Option<ProjectScope> {
        self.scope.clone()
    }
}

/// Repository wired entirely from in-memory doubles, with no detected
/// project.
pub fn memory_repository() -> MemoryRepository {
    memory_repository_with(FixedProjectResolver::none())
}

/// Repository whose resolver always reports the given project.
pub fn memory_repository_for(project_id: &str, project_name: &str) -> MemoryRepository {
    memory_repository_with(FixedProjectResolver::project(project_id, project_name))
}

fn memory_repository_with(resolver: FixedProjectResolver) -> MemoryRepository {
    MemoryRepository::new(
        Box::new(MemContentStore::new()),
        Box::new(MemIndexStore::new()),
        Box::new(resolver),
        Config::default(),
    )
}
