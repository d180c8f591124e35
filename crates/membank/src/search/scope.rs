//! Project scope filtering
//!
//! Every read path (search, list, batch selection) narrows the index through
//! a [`ScopeOptions`] before anything else happens. The default scope keeps
//! global memories plus the caller's current project and hides expired
//! entries.

use chrono::{DateTime, Utc};

use crate::lifecycle::is_expired;
use crate::memory::IndexEntry;

/// Controls which index entries a query can see.
#[derive(Debug, Clone)]
pub struct ScopeOptions {
    /// Canonical id of the caller's project, when one was detected.
    pub current_project_id: Option<String>,
    /// Admit global (unscoped) memories.
    pub include_global: bool,
    /// Ignore project boundaries entirely.
    pub all_projects: bool,
    /// Admit entries whose expiry has passed.
    pub include_expired: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            current_project_id: None,
            include_global: true,
            all_projects: false,
            include_expired: false,
        }
    }
}

impl ScopeOptions {
    /// Default scope for a detected project (or none).
    pub fn for_project(project_id: Option<String>) -> Self {
        Self {
            current_project_id: project_id,
            ..Self::default()
        }
    }

    /// Scope that admits every entry, expired ones included.
    pub fn everything() -> Self {
        Self {
            all_projects: true,
            include_expired: true,
            ..Self::default()
        }
    }

    /// True if the entry is visible under this scope at time `now`.
    pub fn passes(&self, entry: &IndexEntry, now: DateTime<Utc>) -> bool {
        if !self.include_expired && is_expired(entry, now) {
            return false;
        }
        if self.all_projects {
            return true;
        }
        match &entry.project_id {
            None => self.include_global,
            Some(project) => self
                .current_project_id
                .as_deref()
                .is_some_and(|current| current == project),
        }
    }
}
