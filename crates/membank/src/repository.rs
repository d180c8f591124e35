//! Memory repository
//!
//! Coordinates the content store, the index store, and the project resolver
//! behind the create/read/update/delete surface. Content files are the
//! source of truth; the index is derived and can always be rebuilt from
//! them. Writes order content before index so a crash between the two
//! leaves an orphaned file that [`MemoryRepository::rebuild_index`] can
//! reclaim, never an entry pointing at nothing.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{MembankError, Result};
use crate::lifecycle::{is_expired, is_stale};
use crate::memory::{
    INDEX_VERSION, IndexEntry, Memory, MemoryIndex, Priority, dedup_preserving_order,
    expiry_from_ttl, now_utc, parse_record, record_path, serialize_record, slugify,
};
use crate::project::{GitProjectResolver, ProjectResolver, ProjectScope};
use crate::search::ScopeOptions;
use crate::storage::{ContentStore, FsContentStore, FsIndexStore, IndexStore};

/// Options for [`MemoryRepository::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Skip project detection and store the memory unscoped.
    pub global: bool,
    pub priority: Priority,
    /// Relative expiry such as `7d`, `2w`, `3m`, `1y`.
    pub ttl: Option<String>,
    /// Ids of memories this one relates to.
    pub related_to: Vec<String>,
}

/// Field replacements for [`MemoryRepository::update`]. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePatch {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub related_to: Option<Vec<String>>,
}

/// Filter for [`MemoryRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub category: Option<String>,
    pub scope: ScopeOptions,
}

/// Snapshot counts over the whole store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub global: usize,
    pub project_scoped: usize,
    pub expired: usize,
    pub stale: usize,
    pub with_relations: usize,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Outcome of an index rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    /// Entries written to the fresh index.
    pub indexed: usize,
    /// Files under `memories/` that could not be parsed. Never deleted.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Durable store of memories with id-or-prefix lookup.
pub struct MemoryRepository {
    content: Box<dyn ContentStore>,
    index: Box<dyn IndexStore>,
    resolver: Box<dyn ProjectResolver>,
    config: Config,
}

impl MemoryRepository {
    pub fn new(
        content: Box<dyn ContentStore>,
        index: Box<dyn IndexStore>,
        resolver: Box<dyn ProjectResolver>,
        config: Config,
    ) -> Self {
        Self {
            content,
            index,
            resolver,
            config,
        }
    }

    /// Repository over the configured data directory, detecting the project
    /// from the current working directory.
    pub fn open(config: Config) -> Self {
        let data_dir = config.storage.data_dir.clone();
        Self::new(
            Box::new(FsContentStore::new(&data_dir)),
            Box::new(FsIndexStore::new(&data_dir)),
            Box::new(GitProjectResolver::from_current_dir()),
            config,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The caller's current project, if one can be detected.
    pub async fn current_project(&self) -> Option<ProjectScope> {
        self.resolver.resolve().await
    }

    /// Create and persist a new memory.
    ///
    /// A malformed TTL rejects the creation before anything is written.
    pub async fn create(
        &self,
        category: &str,
        content: &str,
        tags: Vec<String>,
        options: CreateOptions,
    ) -> Result<Memory> {
        if category.trim().is_empty() {
            return Err(MembankError::InvalidArgument(
                "category must not be empty".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(MembankError::InvalidArgument(
                "content must not be empty".to_string(),
            ));
        }

        let mut memory = Memory::new(category, content, tags);
        if let Some(ref spec) = options.ttl {
            memory.expires_at = Some(expiry_from_ttl(spec, memory.created)?);
        }
        memory.priority = options.priority;
        memory.related_to = dedup_preserving_order(options.related_to);

        if !options.global {
            if let Some(scope) = self.resolver.resolve().await {
                memory.project_id = Some(scope.id);
                memory.project_name = Some(scope.name);
            }
        }

        let mut index = self.index.read().await?;
        let path = unique_path(&index, &memory);
        self.content.write(&path, &serialize_record(&memory)).await?;

        index.memories.push(memory.index_entry(&path));
        self.index.write(&index).await?;

        debug!(id = %memory.id, path = %path, "created memory");
        Ok(memory)
    }

    /// Fetch a memory by id or id prefix. `None` when nothing matches.
    pub async fn get(&self, id: &str) -> Result<Option<Memory>> {
        let index = self.index.read().await?;
        let Some(pos) = index.resolve(id) else {
            return Ok(None);
        };
        let memory = self.load(&index.memories[pos]).await?;
        Ok(Some(memory))
    }

    /// Load the full record behind an index entry.
    pub(crate) async fn load(&self, entry: &IndexEntry) -> Result<Memory> {
        let text = self.content.read(&entry.path).await?.ok_or_else(|| {
            MembankError::Storage(format!(
                "content missing for {} at {}",
                entry.id, entry.path
            ))
        })?;
        parse_record(&text)
    }

    /// Apply a patch to an existing memory, bumping its updated timestamp.
    /// The storage path never changes, even when the title does.
    pub async fn update(&self, id: &str, patch: UpdatePatch) -> Result<Memory> {
        let mut index = self.index.read().await?;
        let pos = index
            .resolve(id)
            .ok_or_else(|| MembankError::NotFound(format!("memory {id}")))?;

        let entry = index.memories[pos].clone();
        let mut memory = self.load(&entry).await?;

        if let Some(ref content) = patch.content {
            if content.trim().is_empty() {
                return Err(MembankError::InvalidArgument(
                    "content must not be empty".to_string(),
                ));
            }
            memory.set_content(content);
        }
        if let Some(tags) = patch.tags {
            memory.tags = dedup_preserving_order(tags);
        }
        if let Some(related) = patch.related_to {
            memory.related_to = dedup_preserving_order(related);
        }
        memory.updated = now_utc();

        self.content
            .write(&entry.path, &serialize_record(&memory))
            .await?;
        index.memories[pos] = memory.index_entry(&entry.path);
        self.index.write(&index).await?;

        debug!(id = %memory.id, "updated memory");
        Ok(memory)
    }

    /// Delete a memory. Returns false when no entry matched.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut index = self.index.read().await?;
        let Some(pos) = index.resolve(id) else {
            return Ok(false);
        };
        let entry = index.memories.remove(pos);

        // Content is authoritative: remove the blob first so a crash leaves
        // a repairable dangling entry rather than a resurrectable file.
        self.content.delete(&entry.path).await?;
        self.index.write(&index).await?;

        debug!(id = %entry.id, path = %entry.path, "deleted memory");
        Ok(true)
    }

    /// List index entries matching the filter, newest first.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<IndexEntry>> {
        let now = now_utc();
        let index = self.index.read().await?;
        let mut entries: Vec<IndexEntry> = index
            .memories
            .into_iter()
            .filter(|entry| {
                let category_ok = match options.category.as_deref() {
                    Some(category) => entry.category.eq_ignore_ascii_case(category),
                    None => true,
                };
                category_ok && options.scope.passes(entry, now)
            })
            .collect();
        entries.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(entries)
    }

    /// Every index entry in insertion order, unfiltered.
    pub async fn entries(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.index.read().await?.memories)
    }

    /// Snapshot counts over the whole store, expired entries included.
    pub async fn stats(&self) -> Result<StoreStats> {
        let now = now_utc();
        let stale_after = self.config.lifecycle.stale_after_days;
        let entries = self.entries().await?;

        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut global = 0;
        let mut expired = 0;
        let mut stale = 0;
        let mut with_relations = 0;
        for entry in &entries {
            *by_category.entry(entry.category.clone()).or_insert(0) += 1;
            if entry.project_id.is_none() {
                global += 1;
            }
            if is_expired(entry, now) {
                expired += 1;
            }
            if is_stale(entry, now, stale_after) {
                stale += 1;
            }
            if !entry.related_to.is_empty() {
                with_relations += 1;
            }
        }

        // BTreeMap iteration is alphabetical, so the stable sort leaves
        // equal counts in name order
        let mut by_category: Vec<CategoryCount> = by_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(StoreStats {
            total: entries.len(),
            global,
            project_scoped: entries.len() - global,
            expired,
            stale,
            with_relations,
            by_category,
        })
    }

    /// Rebuild the index by scanning every record under `memories/`.
    ///
    /// Reconciles index/content divergence in both directions: orphaned
    /// content files are re-indexed, dangling entries disappear. Files that
    /// fail to parse are skipped and reported, never deleted.
    pub async fn rebuild_index(&self) -> Result<RebuildReport> {
        let paths = self.content.list("memories").await?;
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            if !path.ends_with(".md") {
                continue;
            }
            let Some(text) = self.content.read(&path).await? else {
                continue;
            };
            match parse_record(&text) {
                Ok(memory) => entries.push(memory.index_entry(&path)),
                Err(e) => {
                    warn!(path = %path, "skipping unparseable record: {e}");
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.created.cmp(&b.created));
        let index = MemoryIndex {
            version: INDEX_VERSION,
            memories: entries,
        };
        self.index.write(&index).await?;

        info!(indexed = index.len(), skipped = skipped.len(), "index rebuilt");
        Ok(RebuildReport {
            indexed: index.len(),
            skipped,
        })
    }
}

/// Storage path for a new memory, qualified with an id fragment when the
/// date-and-slug path is already taken.
fn unique_path(index: &MemoryIndex, memory: &Memory) -> String {
    let slug = slugify(&memory.title);
    let path = record_path(&memory.category, &memory.created, &slug);
    if !index.path_taken(&path) {
        return path;
    }
    let qualifier: String = memory.id.chars().take(8).collect();
    record_path(
        &memory.category,
        &memory.created,
        &format!("{slug}-{qualifier}"),
    )
}
