//! Integration tests for filesystem storage
//!
//! Tests the content and index stores against a real directory, plus the
//! repository behaviors that only show up on disk: record placement,
//! persistence across reopen, and index reconciliation.

use membank::MembankError;
use membank::config::Config;
use membank::memory::{Memory, MemoryIndex, record_path, serialize_record, slugify};
use membank::repository::{CreateOptions, MemoryRepository};
use membank::storage::{ContentStore, FsContentStore, FsIndexStore, IndexStore};
use membank::testing::FixedProjectResolver;
use tempfile::tempdir;

/// Test fixture: repository over a real directory with no detected project.
fn fs_repository(dir: &std::path::Path) -> MemoryRepository {
    let mut config = Config::default();
    config.storage.data_dir = dir.to_path_buf();
    MemoryRepository::new(
        Box::new(FsContentStore::new(dir)),
        Box::new(FsIndexStore::new(dir)),
        Box::new(FixedProjectResolver::none()),
        config,
    )
}

/// Test fixture: write a hand-built record where the repository would put it.
async fn plant_record(dir: &std::path::Path, memory: &Memory) -> String {
    let path = record_path(&memory.category, &memory.created, &slugify(&memory.title));
    FsContentStore::new(dir)
        .write(&path, &serialize_record(memory))
        .await
        .unwrap();
    path
}

mod content_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FsContentStore::new(dir.path());

        store.write("memories/task/a.md", "record text").await.unwrap();
        assert_eq!(
            store.read("memories/task/a.md").await.unwrap(),
            Some("record text".to_string())
        );

        assert!(store.delete("memories/task/a.md").await.unwrap());
        assert_eq!(store.read("memories/task/a.md").await.unwrap(), None);
        assert!(!store.delete("memories/task/a.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = FsContentStore::new(dir.path());
        assert_eq!(store.read("memories/task/missing.md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_walks_subdirectories_sorted() {
        let dir = tempdir().unwrap();
        let store = FsContentStore::new(dir.path());
        store.write("memories/task/b.md", "b").await.unwrap();
        store.write("memories/decision/a.md", "a").await.unwrap();
        store.write("unrelated/c.md", "c").await.unwrap();

        let listed = store.list("memories").await.unwrap();
        assert_eq!(
            listed,
            vec![
                "memories/decision/a.md".to_string(),
                "memories/task/b.md".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let dir = tempdir().unwrap();
        let store = FsContentStore::new(dir.path());
        assert!(store.list("memories").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parent_segments_cannot_escape_the_root() {
        let dir = tempdir().unwrap();
        let store = FsContentStore::new(dir.path());

        store.write("memories/../../escape.md", "x").await.unwrap();

        assert_eq!(
            store.read("memories/escape.md").await.unwrap(),
            Some("x".to_string()),
            "dot-dot segments are dropped, not resolved"
        );
        assert!(!dir.path().join("escape.md").exists());
        assert!(!dir.path().parent().unwrap().join("escape.md").exists());
    }
}

mod index_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_index_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FsIndexStore::new(dir.path());
        let index = store.read().await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FsIndexStore::new(dir.path());

        let memory = Memory::new("task", "Indexed note\nbody", vec!["ci".to_string()]);
        let mut index = MemoryIndex::new();
        index.memories.push(memory.index_entry("memories/task/2026-01-01-indexed-note.md"));
        store.write(&index).await.unwrap();

        let loaded = store.read().await.unwrap();
        assert_eq!(loaded.version, index.version);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.memories[0].id, memory.id);
        assert_eq!(loaded.memories[0].tags, vec!["ci".to_string()]);

        assert!(dir.path().join("index.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_index_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("index.json"), "not json at all").unwrap();

        let store = FsIndexStore::new(dir.path());
        let err = store.read().await.unwrap_err();
        assert!(matches!(err, MembankError::Index(_)));
    }
}

mod repository_fs_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_places_record_at_dated_slug_path() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());

        let memory = repo
            .create(
                "decision",
                "# Use Postgres\n\nNeed ACID guarantees.",
                Vec::new(),
                CreateOptions::default(),
            )
            .await
            .unwrap();

        let expected = format!(
            "memories/decision/{}-use-postgres.md",
            memory.created.format("%Y-%m-%d")
        );
        let entries = repo.entries().await.unwrap();
        assert_eq!(entries[0].path, expected);

        let on_disk = std::fs::read_to_string(dir.path().join(&expected)).unwrap();
        assert_eq!(on_disk, serialize_record(&memory), "file layout is byte-stable");
    }

    #[tokio::test]
    async fn test_delete_removes_the_file() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());

        let memory = repo
            .create("task", "Short lived\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();
        let path = repo.entries().await.unwrap()[0].path.clone();
        assert!(dir.path().join(&path).exists());

        assert!(repo.delete(&memory.id).await.unwrap());
        assert!(!dir.path().join(&path).exists());
    }
}

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_memories_survive_reopen() {
        let dir = tempdir().unwrap();

        let id = {
            let repo = fs_repository(dir.path());
            let memory = repo
                .create(
                    "learning",
                    "sqlx tips\nUse query_as for typed rows.",
                    vec!["rust".to_string()],
                    CreateOptions::default(),
                )
                .await
                .unwrap();
            memory.id
        };

        let reopened = fs_repository(dir.path());
        let fetched = reopened.get(&id).await.unwrap();
        assert!(fetched.is_some(), "memory should survive a reopen");

        let fetched = fetched.unwrap();
        assert_eq!(fetched.content, "sqlx tips\nUse query_as for typed rows.");
        assert_eq!(fetched.tags, vec!["rust".to_string()]);
    }
}

mod rebuild_tests {
    use super::*;

    #[tokio::test]
    async fn test_rebuild_adopts_orphan_records() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());
        repo.create("task", "Indexed note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();

        let orphan = Memory::new("learning", "Orphan note\nadded by hand", Vec::new());
        plant_record(dir.path(), &orphan).await;

        let report = repo.rebuild_index().await.unwrap();
        assert_eq!(report.indexed, 2);
        assert!(report.skipped.is_empty());

        let adopted = repo.get(&orphan.id).await.unwrap();
        assert_eq!(adopted.map(|m| m.content), Some("Orphan note\nadded by hand".to_string()));
    }

    #[tokio::test]
    async fn test_rebuild_drops_dangling_entries() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());
        let memory = repo
            .create("task", "Vanishing note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();

        let path = repo.entries().await.unwrap()[0].path.clone();
        std::fs::remove_file(dir.path().join(&path)).unwrap();

        let report = repo.rebuild_index().await.unwrap();
        assert_eq!(report.indexed, 0);
        assert!(repo.get(&memory.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_reports_unparseable_files_and_keeps_them() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());
        repo.create("task", "Good note\nbody", Vec::new(), CreateOptions::default())
            .await
            .unwrap();

        let store = FsContentStore::new(dir.path());
        store
            .write("memories/task/2026-01-01-bad.md", "no header here")
            .await
            .unwrap();

        let report = repo.rebuild_index().await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "memories/task/2026-01-01-bad.md");
        assert!(
            dir.path().join("memories/task/2026-01-01-bad.md").exists(),
            "unparseable files are reported, never deleted"
        );
    }

    #[tokio::test]
    async fn test_rebuild_ignores_non_markdown_files() {
        let dir = tempdir().unwrap();
        let repo = fs_repository(dir.path());

        let store = FsContentStore::new(dir.path());
        store.write("memories/notes.txt", "scratch").await.unwrap();

        let report = repo.rebuild_index().await.unwrap();
        assert_eq!(report.indexed, 0);
        assert!(report.skipped.is_empty());
    }
}
