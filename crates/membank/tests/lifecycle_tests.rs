//! Integration tests for expiry and cleanup
//!
//! Expiry is lazy: read paths hide expired memories and cleanup deletes
//! them on demand. Staleness is advisory and never deletes anything.

use chrono::Duration;
use membank::config::Config;
use membank::lifecycle::LifecycleManager;
use membank::memory::{Memory, now_utc, record_path, serialize_record, slugify};
use membank::repository::{CreateOptions, ListOptions, MemoryRepository};
use membank::search::ScopeOptions;
use membank::storage::ContentStore;
use membank::testing::{FixedProjectResolver, MemContentStore, MemIndexStore, memory_repository};

/// Test fixture: a memory whose timestamps sit `days` in the past.
fn aged_memory(category: &str, content: &str, days: i64) -> Memory {
    let mut memory = Memory::new(category, content, Vec::new());
    memory.created = now_utc() - Duration::days(days);
    memory.updated = memory.created;
    memory
}

/// Test fixture: repository over in-memory stores seeded with records
/// written outside the create path, index rebuilt from them.
async fn seeded_repository(memories: &[Memory]) -> MemoryRepository {
    let content = MemContentStore::new();
    for memory in memories {
        let path = record_path(&memory.category, &memory.created, &slugify(&memory.title));
        content.write(&path, &serialize_record(memory)).await.unwrap();
    }
    let repo = MemoryRepository::new(
        Box::new(content),
        Box::new(MemIndexStore::new()),
        Box::new(FixedProjectResolver::none()),
        Config::default(),
    );
    repo.rebuild_index().await.unwrap();
    repo
}

/// Test fixture: wait long enough for `now_utc` to advance past earlier
/// millisecond-precision timestamps.
async fn next_tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}

mod visibility_tests {
    use super::*;

    #[tokio::test]
    async fn test_expired_memories_hidden_from_listings_until_included() {
        let repo = memory_repository();
        repo.create("task", "Durable note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();
        let fleeting = repo
            .create(
                "task",
                "Fleeting note\nbody",
                Vec::new(),
                CreateOptions {
                    ttl: Some("0d".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        next_tick().await;

        let visible = repo.list(&ListOptions::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Durable note");

        let all = repo
            .list(&ListOptions {
                scope: ScopeOptions {
                    include_expired: true,
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        // Direct lookup ignores expiry entirely
        assert!(repo.get(&fleeting.id).await.unwrap().is_some());
    }
}

mod cleanup_tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_deletes_only_expired_memories() {
        let repo = memory_repository();
        let durable = repo
            .create("task", "Durable note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();
        let long_lived = repo
            .create(
                "task",
                "Long lived note\nbody",
                Vec::new(),
                CreateOptions {
                    ttl: Some("30d".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let fleeting = repo
            .create(
                "task",
                "Fleeting note\nbody",
                Vec::new(),
                CreateOptions {
                    ttl: Some("0d".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        next_tick().await;

        let report = LifecycleManager::new(&repo).cleanup(false).await.unwrap();

        assert!(!report.dry_run);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].id, fleeting.id);
        assert_eq!(report.deleted, 1);
        assert!(report.failed.is_empty());

        assert!(repo.get(&fleeting.id).await.unwrap().is_none());
        assert!(repo.get(&durable.id).await.unwrap().is_some());
        assert!(repo.get(&long_lived.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_dry_run_previews_without_deleting() {
        let repo = memory_repository();
        let fleeting = repo
            .create(
                "task",
                "Fleeting note\nbody",
                Vec::new(),
                CreateOptions {
                    ttl: Some("0d".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        next_tick().await;

        let report = LifecycleManager::new(&repo).cleanup(true).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.deleted, 0);
        assert!(
            repo.get(&fleeting.id).await.unwrap().is_some(),
            "dry run must not delete"
        );
    }

    #[tokio::test]
    async fn test_cleanup_with_nothing_expired() {
        let repo = memory_repository();
        repo.create("task", "Durable note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();

        let report = LifecycleManager::new(&repo).cleanup(false).await.unwrap();
        assert!(report.candidates.is_empty());
        assert_eq!(report.deleted, 0);
        assert_eq!(repo.entries().await.unwrap().len(), 1);
    }
}

mod staleness_tests {
    use super::*;

    #[tokio::test]
    async fn test_stale_memories_counted_in_stats() {
        let repo = seeded_repository(&[
            aged_memory("learning", "Old lesson\nbody", 120),
            aged_memory("learning", "Recent lesson\nbody", 3),
        ])
        .await;

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.stale, 1, "only the memory past the 90 day default is stale");
        assert_eq!(stats.expired, 0);
    }

    #[tokio::test]
    async fn test_cleanup_never_touches_stale_memories() {
        let stale = aged_memory("learning", "Old lesson\nbody", 120);
        let repo = seeded_repository(&[stale.clone()]).await;

        let report = LifecycleManager::new(&repo).cleanup(false).await.unwrap();
        assert!(report.candidates.is_empty(), "staleness is advisory, not expiry");
        assert!(repo.get(&stale.id).await.unwrap().is_some());
    }
}
