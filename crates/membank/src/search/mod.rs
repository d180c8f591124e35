//! Search: scope filtering, scoring, and the query engine
//!
//! Search never scans content files. The index supplies everything scoring
//! needs; full records are hydrated only for the final truncated result
//! set.

pub mod rank;
pub mod scope;

use futures::future::join_all;
use tracing::warn;

pub use rank::{QueryTerms, score_entry};
pub use scope::ScopeOptions;

use crate::error::Result;
use crate::memory::{IndexEntry, Memory, now_utc};
use crate::repository::MemoryRepository;

/// Options for a search query.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum results to return; `None` leaves the result set uncapped.
    pub limit: Option<usize>,
    /// Restrict candidates to one category before scoring.
    pub category: Option<String>,
    pub scope: ScopeOptions,
}

/// A hydrated search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub memory: Memory,
    pub score: f64,
}

/// Scores scoped index entries against a text query.
pub struct SearchEngine<'a> {
    repo: &'a MemoryRepository,
}

impl<'a> SearchEngine<'a> {
    pub fn new(repo: &'a MemoryRepository) -> Self {
        Self { repo }
    }

    /// Run a query and hydrate the final result set.
    ///
    /// Hits whose content has gone missing under the index are skipped with
    /// a warning; an index rebuild clears the divergence.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let ranked = self.ranked_entries(query, options).await?;
        let loaded = join_all(ranked.iter().map(|(entry, _)| self.repo.load(entry))).await;

        let mut results = Vec::with_capacity(ranked.len());
        for ((entry, score), result) in ranked.iter().zip(loaded) {
            match result {
                Ok(memory) => results.push(SearchResult {
                    memory,
                    score: *score,
                }),
                Err(e) => warn!(id = %entry.id, "skipping unreadable search hit: {e}"),
            }
        }
        Ok(results)
    }

    /// Run a query without hydration, for callers that only need index
    /// entries and scores.
    pub async fn ranked_entries(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<(IndexEntry, f64)>> {
        let terms = QueryTerms::parse(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_utc();
        let entries = self.repo.entries().await?;
        let mut scored: Vec<(IndexEntry, f64)> = entries
            .into_iter()
            .filter(|entry| {
                let category_ok = match options.category.as_deref() {
                    Some(category) => entry.category.eq_ignore_ascii_case(category),
                    None => true,
                };
                category_ok && options.scope.passes(entry, now)
            })
            .filter_map(|entry| {
                let score = score_entry(&entry, &terms);
                (score > 0.0).then_some((entry, score))
            })
            .collect();

        // Stable sort keeps index (insertion) order on ties
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = options.limit {
            scored.truncate(limit);
        }
        Ok(scored)
    }
}
