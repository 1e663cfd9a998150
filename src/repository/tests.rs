//! Repository Integration Tests
//!
//! LocalStore over in-memory and file-backed SQLite, and over a backend that
//! starts failing halfway through a session.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use super::{LocalStore, Repository, SqliteRepository, IN_MEMORY};
use crate::domain::{BoardColumn, ColumnValue, Config, Item, SyncState};
use crate::error::{SyncError, SyncResult};

async fn setup_store() -> LocalStore {
    let repo = SqliteRepository::open(Path::new(IN_MEMORY)).expect("Failed to init test DB");
    LocalStore::with_repository(Box::new(repo)).await
}

fn sample_items() -> Vec<Item> {
    vec![
        Item::new("1", "board", "Drill").with_text("sku", "D-1"),
        Item::new("2", "board", "Saw").with_text("sku", "S-1"),
        Item::new("3", "other", "Ladder"),
    ]
}

fn ids(items: &[Item]) -> HashSet<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

#[tokio::test]
async fn test_upsert_then_get_all_by_board() {
    let store = setup_store().await;

    let changed = store.upsert(sample_items()).await;
    assert_eq!(changed, 3);

    let board = store.get_all("board").await;
    assert_eq!(ids(&board), HashSet::from(["1".to_string(), "2".to_string()]));
    assert_eq!(store.get_all("other").await.len(), 1);
}

#[tokio::test]
async fn test_repeated_upsert_reports_no_changes() {
    let store = setup_store().await;
    store.upsert(sample_items()).await;
    let before = store.get_all("board").await;

    assert_eq!(store.upsert(sample_items()).await, 0);

    let after = store.get_all("board").await;
    for item in &before {
        let same = after.iter().find(|i| i.id == item.id).unwrap();
        assert_eq!(same, item);
    }
}

#[tokio::test]
async fn test_mark_dirty_preserved_over_stale_pull() {
    let store = setup_store().await;
    store.upsert(sample_items()).await;

    store
        .mark_dirty("board", "1", "barcode", ColumnValue::text("0123"))
        .await;

    // Remote snapshot without the edit
    let changed = store.upsert(sample_items()).await;
    assert_eq!(changed, 0);

    let item = store.get("board", "1").await.unwrap();
    assert_eq!(item.sync_state, SyncState::Dirty);
    assert_eq!(item.value_of("barcode"), "0123");
    assert_eq!(store.get_dirty("board").await.len(), 1);
}

#[tokio::test]
async fn test_confirming_pull_clears_dirty() {
    let store = setup_store().await;
    store.upsert(sample_items()).await;
    store
        .mark_dirty("board", "1", "barcode", ColumnValue::text("0123"))
        .await;

    let caught_up = vec![Item::new("1", "board", "Drill")
        .with_text("sku", "D-1")
        .with_text("barcode", "0123")];
    assert_eq!(store.upsert(caught_up).await, 1);

    let item = store.get("board", "1").await.unwrap();
    assert_eq!(item.sync_state, SyncState::Synced);
    assert!(store.get_dirty("board").await.is_empty());
}

#[tokio::test]
async fn test_mark_dirty_creates_unknown_item() {
    let store = setup_store().await;

    let item = store
        .mark_dirty("board", "99", "barcode", ColumnValue::text("X"))
        .await;

    assert_eq!(item.board_id, "board");
    assert!(item.is_dirty());
    assert_eq!(store.get_all("board").await.len(), 1);
}

#[tokio::test]
async fn test_confirm_pushed_ignores_newer_edit() {
    let store = setup_store().await;
    let first = store
        .mark_dirty("board", "1", "barcode", ColumnValue::text("A"))
        .await;
    let second = store
        .mark_dirty("board", "1", "barcode", ColumnValue::text("B"))
        .await;
    assert!(second.updated_at > first.updated_at);

    assert!(!store.confirm_pushed("board", "1", first.updated_at).await);
    assert!(store.get("board", "1").await.unwrap().is_dirty());

    assert!(store.confirm_pushed("board", "1", second.updated_at).await);
    assert!(!store.get("board", "1").await.unwrap().is_dirty());
}

#[tokio::test]
async fn test_mark_synced_unknown_item() {
    let store = setup_store().await;
    assert_eq!(
        store.mark_synced("board", "nope").await,
        Err(SyncError::NotFound("nope".to_string()))
    );
}

#[tokio::test]
async fn test_remove_absent_keeps_dirty_items() {
    let store = setup_store().await;
    store.upsert(sample_items()).await;
    store
        .mark_dirty("board", "2", "barcode", ColumnValue::text("S"))
        .await;

    let present = HashSet::from(["1".to_string()]);
    let removed = store.remove_absent("board", &present).await;

    assert_eq!(removed, 0);
    assert!(store.get("board", "2").await.is_some());

    store.mark_synced("board", "2").await.unwrap();
    assert_eq!(store.remove_absent("board", &present).await, 1);
    assert!(store.get("board", "2").await.is_none());
    // Other boards are untouched
    assert!(store.get("other", "3").await.is_some());
}

#[tokio::test]
async fn test_same_id_on_two_boards_stays_separate() {
    let store = setup_store().await;
    store
        .upsert(vec![Item::new("7", "board-a", "Drill").with_text("barcode", "A")])
        .await;

    let changed = store
        .upsert(vec![Item::new("7", "board-b", "Saw").with_text("barcode", "B")])
        .await;
    assert_eq!(changed, 1);

    store
        .mark_dirty("board-b", "7", "barcode", ColumnValue::text("B2"))
        .await;

    let a = store.get("board-a", "7").await.unwrap();
    assert_eq!(a.name, "Drill");
    assert_eq!(a.value_of("barcode"), "A");
    assert!(!a.is_dirty());
    assert!(store.get_dirty("board-a").await.is_empty());

    let dirty = store.get_dirty("board-b").await;
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].value_of("barcode"), "B2");

    // Pruning one board leaves the other's copy
    store.mark_synced("board-b", "7").await.unwrap();
    assert_eq!(store.remove_absent("board-b", &HashSet::new()).await, 1);
    assert!(store.get("board-a", "7").await.is_some());
}

#[tokio::test]
async fn test_same_id_on_two_boards_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.db");

    {
        let store = LocalStore::open(&path).await;
        store
            .upsert(vec![
                Item::new("7", "board-a", "Drill"),
                Item::new("7", "board-b", "Saw"),
            ])
            .await;
        store.remove_absent("board-b", &HashSet::new()).await;
    }

    let reopened = LocalStore::open(&path).await;
    assert_eq!(reopened.get("board-a", "7").await.unwrap().name, "Drill");
    assert!(reopened.get("board-b", "7").await.is_none());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.db");

    {
        let store = LocalStore::open(&path).await;
        store.upsert(sample_items()).await;
        store
            .mark_dirty("board", "1", "barcode", ColumnValue::text("0123"))
            .await;
        store
            .save_config(Config::new("board").with_barcode_column("barcode"))
            .await;
        store
            .save_columns(
                "board",
                vec![BoardColumn { id: "sku".into(), title: "SKU".into(), kind: None }],
            )
            .await;
        assert!(!store.is_degraded().await);
    }

    let reopened = LocalStore::open(&path).await;
    let item = reopened.get("board", "1").await.unwrap();
    assert!(item.is_dirty());
    assert_eq!(item.value_of("barcode"), "0123");
    assert_eq!(reopened.get_all("board").await.len(), 2);
    assert_eq!(
        reopened.config("board").await.unwrap().barcode_column(),
        Some("barcode")
    );
    assert_eq!(reopened.columns("board").await[0].title, "SKU");
}

/// Backend that works until told to fail
struct FlakyRepository {
    inner: SqliteRepository,
    broken: Arc<AtomicBool>,
}

impl FlakyRepository {
    fn check(&self) -> SyncResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(SyncError::Storage("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for FlakyRepository {
    async fn load_items(&self) -> SyncResult<Vec<Item>> {
        self.check()?;
        self.inner.load_items().await
    }

    async fn save_items(&self, items: &[Item]) -> SyncResult<()> {
        self.check()?;
        self.inner.save_items(items).await
    }

    async fn delete_items(&self, board_id: &str, ids: &[String]) -> SyncResult<()> {
        self.check()?;
        self.inner.delete_items(board_id, ids).await
    }

    async fn load_configs(&self) -> SyncResult<Vec<Config>> {
        self.check()?;
        self.inner.load_configs().await
    }

    async fn save_config(&self, config: &Config) -> SyncResult<()> {
        self.check()?;
        self.inner.save_config(config).await
    }

    async fn load_columns(&self) -> SyncResult<Vec<(String, Vec<BoardColumn>)>> {
        self.check()?;
        self.inner.load_columns().await
    }

    async fn save_columns(&self, board_id: &str, columns: &[BoardColumn]) -> SyncResult<()> {
        self.check()?;
        self.inner.save_columns(board_id, columns).await
    }
}

#[tokio::test]
async fn test_storage_failure_degrades_to_memory() {
    let broken = Arc::new(AtomicBool::new(false));
    let repo = FlakyRepository {
        inner: SqliteRepository::open(Path::new(IN_MEMORY)).unwrap(),
        broken: broken.clone(),
    };
    let store = LocalStore::with_repository(Box::new(repo)).await;
    store.upsert(sample_items()).await;
    assert!(!store.is_degraded().await);

    broken.store(true, Ordering::SeqCst);
    let item = store
        .mark_dirty("board", "1", "barcode", ColumnValue::text("0123"))
        .await;
    assert!(item.is_dirty());

    assert!(matches!(store.storage_fault().await, Some(SyncError::Storage(_))));
    // Still serving reads and writes from memory
    assert_eq!(store.get("board", "1").await.unwrap().value_of("barcode"), "0123");
    store.upsert(vec![Item::new("4", "board", "Hose")]).await;
    assert_eq!(store.get_all("board").await.len(), 3);
}

#[tokio::test]
async fn test_unopenable_file_starts_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"plain file").unwrap();
    // Parent directory cannot be created over a regular file
    let path: PathBuf = blocker.join("scan.db");

    let store = LocalStore::open(&path).await;
    assert!(store.is_degraded().await);

    store.upsert(sample_items()).await;
    assert_eq!(store.get_all("board").await.len(), 2);
}

fn arb_item() -> impl Strategy<Value = Item> {
    ("[a-z0-9]{1,6}", "[A-Za-z ]{0,12}", proptest::option::of("[A-Z0-9]{0,8}")).prop_map(
        |(id, name, barcode)| {
            let item = Item::new(id, "board", name);
            match barcode {
                Some(code) => item.with_text("barcode", code),
                None => item,
            }
        },
    )
}

proptest! {
    #[test]
    fn prop_upsert_round_trip(items in proptest::collection::vec(arb_item(), 0..20)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let stored = rt.block_on(async {
            let store = setup_store().await;
            store.upsert(items.clone()).await;
            store.get_all("board").await
        });

        prop_assert_eq!(ids(&stored), ids(&items));
        for item in &stored {
            // Later duplicates win
            let expected = items.iter().rev().find(|i| i.id == item.id).unwrap();
            prop_assert!(item.same_content(expected));
        }
    }
}
