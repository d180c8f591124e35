//! Batch tag and delete operations
//!
//! Every batch call produces a report naming its candidate set, and a dry
//! run produces exactly the report a real run would without writing
//! anything. Per-item failures never abort the rest of the batch.
//!
//! Dry run defaults differ on purpose: tag operations default to applying,
//! bulk delete defaults to previewing and must be forced.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{MembankError, Result};
use crate::lifecycle::{is_expired, is_stale};
use crate::memory::{IndexEntry, now_utc};
use crate::repository::{MemoryRepository, UpdatePatch};
use crate::search::{ScopeOptions, SearchEngine, SearchOptions};

/// Selection options for tag operations.
#[derive(Debug, Clone, Default)]
pub struct TagOptions {
    /// Select search matches instead of a listing.
    pub query: Option<String>,
    /// Without a query, narrow the listing to one category.
    pub category: Option<String>,
    pub dry_run: bool,
}

/// Filters for [`BatchOperator::bulk_delete`]. At least one must be set.
#[derive(Debug, Clone)]
pub struct BulkDeleteOptions {
    pub category: Option<String>,
    pub expired: bool,
    pub stale: bool,
    pub query: Option<String>,
    pub dry_run: bool,
}

impl Default for BulkDeleteOptions {
    fn default() -> Self {
        Self {
            category: None,
            expired: false,
            stale: false,
            query: None,
            // Deletion previews unless explicitly forced
            dry_run: true,
        }
    }
}

/// Aggregate outcome of a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// True when nothing was written.
    pub dry_run: bool,
    /// The full selection, identical between a dry run and a real run.
    pub candidates: Vec<BatchCandidate>,
    /// Entries actually updated or deleted.
    pub mutated: usize,
    /// No-op successes, e.g. entries already bearing the tag.
    pub skipped: usize,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    fn new(dry_run: bool, selection: &[IndexEntry]) -> Self {
        Self {
            dry_run,
            candidates: selection
                .iter()
                .map(|entry| BatchCandidate {
                    id: entry.id.clone(),
                    title: entry.title.clone(),
                })
                .collect(),
            mutated: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCandidate {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub reason: String,
}

/// Multi-memory mutations over a repository.
pub struct BatchOperator<'a> {
    repo: &'a MemoryRepository,
}

impl<'a> BatchOperator<'a> {
    pub fn new(repo: &'a MemoryRepository) -> Self {
        Self { repo }
    }

    /// Add a tag to every selected memory. Entries already bearing the tag
    /// count as skipped, not failed.
    pub async fn add_tag(&self, tag: &str, options: &TagOptions) -> Result<BatchReport> {
        let tag = valid_tag(tag)?;
        let selection = self
            .select(options.query.as_deref(), options.category.as_deref())
            .await?;

        let mut report = BatchReport::new(options.dry_run, &selection);
        if options.dry_run {
            return Ok(report);
        }

        for entry in &selection {
            if entry.tags.iter().any(|t| t == tag) {
                report.skipped += 1;
                continue;
            }
            let mut tags = entry.tags.clone();
            tags.push(tag.to_string());
            match self.apply_tags(&entry.id, tags).await {
                Ok(()) => report.mutated += 1,
                Err(e) => report.failed.push(BatchFailure {
                    id: entry.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(report)
    }

    /// Remove a tag from every selected memory that bears it.
    pub async fn remove_tag(&self, tag: &str, options: &TagOptions) -> Result<BatchReport> {
        let tag = valid_tag(tag)?;
        let mut selection = self
            .select(options.query.as_deref(), options.category.as_deref())
            .await?;
        selection.retain(|entry| entry.tags.iter().any(|t| t == tag));

        let mut report = BatchReport::new(options.dry_run, &selection);
        if options.dry_run {
            return Ok(report);
        }

        for entry in &selection {
            let tags: Vec<String> = entry
                .tags
                .iter()
                .filter(|t| t.as_str() != tag)
                .cloned()
                .collect();
            match self.apply_tags(&entry.id, tags).await {
                Ok(()) => report.mutated += 1,
                Err(e) => report.failed.push(BatchFailure {
                    id: entry.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(report)
    }

    /// Delete every memory matching the intersection of the supplied
    /// filters. Rejected outright when no filter is given.
    pub async fn bulk_delete(&self, options: &BulkDeleteOptions) -> Result<BatchReport> {
        if options.category.is_none()
            && !options.expired
            && !options.stale
            && options.query.is_none()
        {
            return Err(MembankError::InvalidArgument(
                "bulk delete needs at least one filter (category, expired, stale, or query)"
                    .to_string(),
            ));
        }

        let now = now_utc();
        let stale_after = self.repo.config().lifecycle.stale_after_days;

        let mut selection = self.repo.entries().await?;
        if let Some(ref category) = options.category {
            selection.retain(|entry| entry.category.eq_ignore_ascii_case(category));
        }
        if options.expired {
            selection.retain(|entry| is_expired(entry, now));
        }
        if options.stale {
            selection.retain(|entry| is_stale(entry, now, stale_after));
        }
        if let Some(ref query) = options.query {
            let matched = self.search_ids(query).await?;
            selection.retain(|entry| matched.contains(&entry.id));
        }

        let mut report = BatchReport::new(options.dry_run, &selection);
        if options.dry_run {
            return Ok(report);
        }

        for entry in &selection {
            match self.repo.delete(&entry.id).await {
                Ok(true) => report.mutated += 1,
                // Vanished between selection and delete
                Ok(false) => report.skipped += 1,
                Err(e) => report.failed.push(BatchFailure {
                    id: entry.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(report)
    }

    /// Selection for tag operations: search matches when a query is given,
    /// otherwise a (possibly category-narrowed) listing of the whole index.
    async fn select(&self, query: Option<&str>, category: Option<&str>) -> Result<Vec<IndexEntry>> {
        if let Some(query) = query {
            let matched = self.search_ids(query).await?;
            let mut entries = self.repo.entries().await?;
            entries.retain(|entry| matched.contains(&entry.id));
            return Ok(entries);
        }
        let mut entries = self.repo.entries().await?;
        if let Some(category) = category {
            entries.retain(|entry| entry.category.eq_ignore_ascii_case(category));
        }
        Ok(entries)
    }

    /// Ids matched by a query across every project, expired included,
    /// without a result cap. Batch selection sees the whole store.
    async fn search_ids(&self, query: &str) -> Result<HashSet<String>> {
        let engine = SearchEngine::new(self.repo);
        let options = SearchOptions {
            limit: None,
            scope: ScopeOptions::everything(),
            ..Default::default()
        };
        let ranked = engine.ranked_entries(query, &options).await?;
        Ok(ranked.into_iter().map(|(entry, _)| entry.id).collect())
    }

    async fn apply_tags(&self, id: &str, tags: Vec<String>) -> Result<()> {
        self.repo
            .update(
                id,
                UpdatePatch {
                    tags: Some(tags),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

fn valid_tag(tag: &str) -> Result<&str> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(MembankError::InvalidArgument(
            "tag must not be empty".to_string(),
        ));
    }
    Ok(tag)
}
