//! Local Store
//!
//! Per-board item cache that the UI reads from, online or not.
//!
//! Everything lives in an in-memory mirror that is written through to a
//! durable [`Repository`]. The first durable failure is logged, remembered as
//! a `StorageError`, and the store carries on from the mirror alone for the
//! rest of the session.
//!
//! All access goes through one async mutex, so writers never interleave.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::sqlite_repo::SqliteRepository;
use super::traits::Repository;
use crate::domain::{BoardColumn, ColumnValue, Config, Item};
use crate::error::{SyncError, SyncResult};

/// Item ids are only unique within a board
type ItemKey = (String, String);

fn item_key(board_id: &str, item_id: &str) -> ItemKey {
    (board_id.to_string(), item_id.to_string())
}

struct StoreState {
    durable: Option<Box<dyn Repository>>,
    items: HashMap<ItemKey, Item>,
    configs: HashMap<String, Config>,
    columns: HashMap<String, Vec<BoardColumn>>,
    fault: Option<SyncError>,
}

impl StoreState {
    fn empty(durable: Option<Box<dyn Repository>>) -> Self {
        Self {
            durable,
            items: HashMap::new(),
            configs: HashMap::new(),
            columns: HashMap::new(),
            fault: None,
        }
    }

    /// Drop the durable backend for the rest of the session
    fn degrade(&mut self, operation: &str, err: SyncError) {
        log::warn!(
            "Local storage failed during {}: {}; continuing in memory",
            operation,
            err
        );
        self.durable = None;
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    async fn persist_items(&mut self, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        let result = match &self.durable {
            Some(repo) => repo.save_items(items).await,
            None => return,
        };
        if let Err(e) = result {
            self.degrade("save items", e);
        }
    }

    async fn persist_deletes(&mut self, board_id: &str, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        let result = match &self.durable {
            Some(repo) => repo.delete_items(board_id, ids).await,
            None => return,
        };
        if let Err(e) = result {
            self.degrade("delete items", e);
        }
    }

    fn board_items<'a>(&'a self, board_id: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.values().filter(move |item| item.board_id == board_id)
    }
}

/// What an incoming payload does to the cached copy
fn merge_incoming(existing: Option<&Item>, incoming: Item) -> Option<Item> {
    match existing {
        None => Some(incoming),
        Some(local) if local.is_dirty() => {
            if local.is_confirmed_by(&incoming) {
                let mut confirmed = incoming;
                confirmed.mark_synced();
                Some(confirmed)
            } else {
                // Remote has not seen the local edit yet
                None
            }
        }
        Some(local) if local.same_content(&incoming) && local.sync_state == incoming.sync_state => None,
        Some(_) => Some(incoming),
    }
}

/// Durable, keyed item cache with explicit sync state
pub struct LocalStore {
    state: Mutex<StoreState>,
}

impl LocalStore {
    /// Open the SQLite cache at `db_path`.
    ///
    /// Never fails: when the file cannot be opened the store starts degraded
    /// and [`LocalStore::storage_fault`] reports why.
    pub async fn open(db_path: &Path) -> Self {
        match SqliteRepository::open(db_path) {
            Ok(repo) => Self::with_repository(Box::new(repo)).await,
            Err(e) => {
                let mut state = StoreState::empty(None);
                state.degrade("open", e);
                Self { state: Mutex::new(state) }
            }
        }
    }

    /// Load everything the repository holds into the mirror
    pub async fn with_repository(repo: Box<dyn Repository>) -> Self {
        let mut state = StoreState::empty(None);

        let loaded = async {
            let items = repo.load_items().await?;
            let configs = repo.load_configs().await?;
            let columns = repo.load_columns().await?;
            Ok::<_, SyncError>((items, configs, columns))
        }
        .await;

        match loaded {
            Ok((items, configs, columns)) => {
                log::info!("Loaded {} cached items from local storage", items.len());
                state.items = items
                    .into_iter()
                    .map(|i| (item_key(&i.board_id, &i.id), i))
                    .collect();
                state.configs = configs.into_iter().map(|c| (c.board_id.clone(), c)).collect();
                state.columns = columns.into_iter().collect();
                state.durable = Some(repo);
            }
            Err(e) => state.degrade("load", e),
        }

        Self { state: Mutex::new(state) }
    }

    /// Purely in-memory store; nothing survives the process
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(StoreState::empty(None)),
        }
    }

    /// Insert or replace items by board and id; returns how many records changed.
    ///
    /// A dirty record is only replaced by a payload that already shows its
    /// edit; otherwise the local copy is kept untouched.
    pub async fn upsert(&self, items: Vec<Item>) -> usize {
        let mut state = self.state.lock().await;
        let mut changed: Vec<Item> = Vec::new();
        let mut preserved = 0usize;

        for incoming in items {
            let key = item_key(&incoming.board_id, &incoming.id);
            let existing = state.items.get(&key);
            let was_dirty = existing.map(Item::is_dirty).unwrap_or(false);
            match merge_incoming(existing, incoming) {
                Some(item) => {
                    state.items.insert(key, item.clone());
                    // A repeated item in one batch replaces the earlier entry
                    changed.retain(|c| c.id != item.id || c.board_id != item.board_id);
                    changed.push(item);
                }
                None if was_dirty => preserved += 1,
                None => {}
            }
        }

        if preserved > 0 {
            log::debug!("Kept {} dirty items over incoming payloads", preserved);
        }
        state.persist_items(&changed).await;
        changed.len()
    }

    /// All cached items of a board, in no particular order
    pub async fn get_all(&self, board_id: &str) -> Vec<Item> {
        let state = self.state.lock().await;
        state.board_items(board_id).cloned().collect()
    }

    pub async fn get(&self, board_id: &str, item_id: &str) -> Option<Item> {
        self.state
            .lock()
            .await
            .items
            .get(&item_key(board_id, item_id))
            .cloned()
    }

    /// Apply a local column edit and mark the item dirty.
    ///
    /// An item that has never been pulled is created on the spot.
    pub async fn mark_dirty(
        &self,
        board_id: &str,
        item_id: &str,
        column_id: &str,
        value: ColumnValue,
    ) -> Item {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let item = state
            .items
            .entry(item_key(board_id, item_id))
            .or_insert_with(|| Item::new(item_id, board_id, ""));
        // Edit timestamps must strictly increase; they identify pushed revisions
        let at = if now > item.updated_at {
            now
        } else {
            item.updated_at + Duration::microseconds(1)
        };
        item.apply_edit(column_id, value, at);
        let snapshot = item.clone();

        log::info!("Updated item {} locally (dirty)", item_id);
        state.persist_items(std::slice::from_ref(&snapshot)).await;
        snapshot
    }

    /// Mark an item synced regardless of later edits
    pub async fn mark_synced(&self, board_id: &str, item_id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .get_mut(&item_key(board_id, item_id))
            .ok_or_else(|| SyncError::NotFound(item_id.to_string()))?;
        if !item.is_dirty() {
            return Ok(());
        }
        item.mark_synced();
        let snapshot = item.clone();
        state.persist_items(std::slice::from_ref(&snapshot)).await;
        Ok(())
    }

    /// Mark synced only if the item still carries the edit made at
    /// `edited_at`. Returns false when a newer edit arrived meanwhile.
    pub async fn confirm_pushed(
        &self,
        board_id: &str,
        item_id: &str,
        edited_at: DateTime<Utc>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&item_key(board_id, item_id)) else {
            return false;
        };
        if !item.is_dirty() || item.updated_at != edited_at {
            return false;
        }
        item.mark_synced();
        let snapshot = item.clone();
        state.persist_items(std::slice::from_ref(&snapshot)).await;
        log::info!("Marked item {} as synced", item_id);
        true
    }

    pub async fn get_dirty(&self, board_id: &str) -> Vec<Item> {
        let state = self.state.lock().await;
        let mut dirty: Vec<Item> = state
            .board_items(board_id)
            .filter(|item| item.is_dirty())
            .cloned()
            .collect();
        // Oldest edit first
        dirty.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)));
        dirty
    }

    /// Drop synced items of `board_id` that are not in `present_ids`.
    /// Dirty items are always kept.
    pub async fn remove_absent(&self, board_id: &str, present_ids: &HashSet<String>) -> usize {
        let mut state = self.state.lock().await;
        let doomed: Vec<String> = state
            .board_items(board_id)
            .filter(|item| !item.is_dirty() && !present_ids.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();

        for id in &doomed {
            state.items.remove(&item_key(board_id, id));
        }
        state.persist_deletes(board_id, &doomed).await;
        doomed.len()
    }

    pub async fn save_config(&self, config: Config) {
        let mut state = self.state.lock().await;
        state.configs.insert(config.board_id.clone(), config.clone());
        let result = match &state.durable {
            Some(repo) => repo.save_config(&config).await,
            None => return,
        };
        if let Err(e) = result {
            state.degrade("save config", e);
        }
    }

    /// Last known configuration of a board
    pub async fn config(&self, board_id: &str) -> Option<Config> {
        self.state.lock().await.configs.get(board_id).cloned()
    }

    pub async fn save_columns(&self, board_id: &str, columns: Vec<BoardColumn>) {
        let mut state = self.state.lock().await;
        state.columns.insert(board_id.to_string(), columns.clone());
        let result = match &state.durable {
            Some(repo) => repo.save_columns(board_id, &columns).await,
            None => return,
        };
        if let Err(e) = result {
            state.degrade("save columns", e);
        }
    }

    pub async fn columns(&self, board_id: &str) -> Vec<BoardColumn> {
        self.state
            .lock()
            .await
            .columns
            .get(board_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The storage error that switched the store to memory, if any
    pub async fn storage_fault(&self) -> Option<SyncError> {
        self.state.lock().await.fault.clone()
    }

    pub async fn is_degraded(&self) -> bool {
        self.state.lock().await.fault.is_some()
    }
}
