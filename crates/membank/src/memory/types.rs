//! Memory types for the membank system
//!
//! Defines the core data structures for storing and retrieving memories:
//! the full Memory entity, its denormalized IndexEntry summary, and the
//! index document that holds all summaries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MembankError;

/// Version written to new index documents.
pub const INDEX_VERSION: u32 = 1;

/// Maximum length of a derived title, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum length of a derived snippet, in characters.
pub const SNIPPET_MAX_CHARS: usize = 150;

/// Current time truncated to millisecond precision, the resolution of
/// on-disk record timestamps. All membank timestamps originate here so a
/// record round-trips losslessly.
pub fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// A single memory unit: a persisted note with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    /// Unique identifier, generated at creation, immutable
    pub id: String,
    /// Storage category (recommended: project, decision, preference, learning, task)
    pub category: String,
    /// Derived from the first line of content; recomputed on content change
    pub title: String,
    /// Full text body
    pub content: String,
    /// Labels attached to this memory; order preserved for display
    pub tags: Vec<String>,
    /// When this memory was created
    pub created: DateTime<Utc>,
    /// When this memory was last mutated
    pub updated: DateTime<Utc>,
    /// Project identity this memory is scoped to; None means global
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Human-readable project name matching `project_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Ranking priority
    #[serde(default)]
    pub priority: Priority,
    /// When this memory expires; computed once at creation, never recomputed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Ids of related memories; symmetric with the other side
    #[serde(default)]
    pub related_to: Vec<String>,
}

impl Memory {
    /// Create a new memory with derived title and default metadata.
    pub fn new(category: &str, content: &str, tags: Vec<String>) -> Self {
        let now = now_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            category: category.to_string(),
            title: derive_title(content),
            content: content.to_string(),
            tags: dedup_preserving_order(tags),
            created: now,
            updated: now,
            project_id: None,
            project_name: None,
            priority: Priority::Normal,
            expires_at: None,
            related_to: Vec::new(),
        }
    }

    /// Replace the content, re-deriving the title.
    pub fn set_content(&mut self, content: &str) {
        self.title = derive_title(content);
        self.content = content.to_string();
    }

    /// Build the denormalized index summary for this memory.
    pub fn index_entry(&self, path: &str) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            category: self.category.clone(),
            title: self.title.clone(),
            snippet: derive_snippet(&self.content),
            tags: self.tags.clone(),
            created: self.created,
            updated: self.updated,
            project_id: self.project_id.clone(),
            project_name: self.project_name.clone(),
            priority: self.priority,
            expires_at: self.expires_at,
            related_to: self.related_to.clone(),
            path: path.to_string(),
        }
    }
}

/// Ranking priority of a memory. Affects search scoring only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = MembankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(MembankError::InvalidPriority(other.to_string())),
        }
    }
}

/// Denormalized summary of a Memory, stored in the index document.
///
/// Carries every Memory field except the full content, plus a snippet and
/// the storage path of the content blob. The index is the only structure
/// scanned during search and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub category: String,
    pub title: String,
    /// First ~150 characters of body text, excluding the title line
    pub snippet: String,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_to: Vec<String>,
    /// Logical storage path of the content blob
    pub path: String,
}

/// The index document: one JSON file holding all index entries in
/// insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryIndex {
    pub version: u32,
    pub memories: Vec<IndexEntry>,
}

impl MemoryIndex {
    /// Create an empty index at the current version.
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            memories: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Position of the entry with exactly this id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.memories.iter().position(|e| e.id == id)
    }

    /// Resolve an id or id prefix to an entry position.
    ///
    /// Exact matches win; otherwise the first prefix match in stored
    /// (insertion) order is taken.
    pub fn resolve(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        if let Some(pos) = self.position(id) {
            return Some(pos);
        }
        let mut matches = self.memories.iter().enumerate().filter(|(_, e)| e.id.starts_with(id));
        let first = matches.next().map(|(i, _)| i);
        if first.is_some() && matches.next().is_some() {
            tracing::debug!(prefix = id, "id prefix is ambiguous, taking first match");
        }
        first
    }

    /// True if any entry already uses this storage path.
    pub fn path_taken(&self, path: &str) -> bool {
        self.memories.iter().any(|e| e.path == path)
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a title from the first line of content: leading heading markers
/// are stripped and the result is truncated to 100 characters.
pub fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("");
    let stripped = first_line.trim_start_matches('#').trim();
    stripped.chars().take(TITLE_MAX_CHARS).collect()
}

/// Derive a snippet from content: everything after the title line, joined
/// into one line and truncated to 150 characters.
pub fn derive_snippet(content: &str) -> String {
    let body: Vec<&str> = content.lines().skip(1).collect();
    body.join(" ").trim().chars().take(SNIPPET_MAX_CHARS).collect()
}

/// Turn a title into a filename-safe slug: lowercase alphanumeric runs
/// separated by single dashes, at most 50 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let truncated: String = slug.trim_end_matches('-').chars().take(50).collect();
    let truncated = truncated.trim_end_matches('-').to_string();
    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

/// Drop duplicate strings, keeping first occurrences in order.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
