//! Memory lifecycle: expiry and staleness
//!
//! Expiry is lazy. Nothing scans for expired memories in the background;
//! read paths hide them via scope filtering and `cleanup` deletes them on
//! demand. Staleness is advisory only and never triggers deletion.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::memory::{IndexEntry, now_utc};
use crate::repository::MemoryRepository;

/// True when the entry's expiry timestamp is strictly in the past.
pub fn is_expired(entry: &IndexEntry, now: DateTime<Utc>) -> bool {
    entry.expires_at.is_some_and(|expires_at| expires_at < now)
}

/// True when the entry has no expiry of its own and has not been mutated
/// for more than `stale_after_days` days. Entries with a TTL are never
/// stale; expiry already bounds their lifetime.
pub fn is_stale(entry: &IndexEntry, now: DateTime<Utc>, stale_after_days: i64) -> bool {
    if entry.expires_at.is_some() {
        return false;
    }
    let Some(window) = Duration::try_days(stale_after_days) else {
        return false;
    };
    now.signed_duration_since(entry.updated) > window
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// True when nothing was deleted.
    pub dry_run: bool,
    /// Expired memories found by the scan.
    pub candidates: Vec<CleanupCandidate>,
    pub deleted: usize,
    pub failed: Vec<CleanupFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupCandidate {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub id: String,
    pub reason: String,
}

/// Deletes expired memories from a repository.
pub struct LifecycleManager<'a> {
    repo: &'a MemoryRepository,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(repo: &'a MemoryRepository) -> Self {
        Self { repo }
    }

    /// Find every expired memory and, unless `dry_run`, delete them.
    /// Failures are reported per memory; the pass keeps going.
    pub async fn cleanup(&self, dry_run: bool) -> Result<CleanupReport> {
        let now = now_utc();
        let entries = self.repo.entries().await?;
        let expired: Vec<IndexEntry> = entries
            .into_iter()
            .filter(|entry| is_expired(entry, now))
            .collect();

        let mut report = CleanupReport {
            dry_run,
            candidates: expired
                .iter()
                .map(|entry| CleanupCandidate {
                    id: entry.id.clone(),
                    title: entry.title.clone(),
                })
                .collect(),
            deleted: 0,
            failed: Vec::new(),
        };

        if dry_run {
            debug!(candidates = report.candidates.len(), "cleanup dry run");
            return Ok(report);
        }

        for entry in &expired {
            match self.repo.delete(&entry.id).await {
                Ok(true) => report.deleted += 1,
                // Already gone; nothing to count
                Ok(false) => {}
                Err(e) => report.failed.push(CleanupFailure {
                    id: entry.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        debug!(
            deleted = report.deleted,
            failed = report.failed.len(),
            "cleanup finished"
        );
        Ok(report)
    }
}
