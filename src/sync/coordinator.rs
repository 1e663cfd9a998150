//! Sync Coordinator
//!
//! Runs the reconciliation cycle between the local store and the board
//! service: resolve the config, push dirty items one by one, pull the board
//! and merge it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use super::{SyncReport, SyncSettings, SyncStatus};
use crate::domain::{Config, Item};
use crate::error::{SyncError, SyncResult};
use crate::remote::{CredentialStore, RemoteBoard, RemoteError};
use crate::repository::LocalStore;

/// Releases the board's in-flight slot on every exit path
struct InFlightGuard<'a> {
    boards: &'a Mutex<HashSet<String>>,
    board_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.board_id);
    }
}

pub struct SyncCoordinator {
    store: Arc<LocalStore>,
    remote: Arc<dyn RemoteBoard>,
    credentials: Arc<dyn CredentialStore>,
    settings: SyncSettings,
    in_flight: Mutex<HashSet<String>>,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<LocalStore>,
        remote: Arc<dyn RemoteBoard>,
        credentials: Arc<dyn CredentialStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            credentials,
            settings,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Whether a cycle for `board_id` is running right now
    pub fn is_syncing(&self, board_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(board_id)
    }

    fn begin(&self, board_id: &str) -> SyncResult<InFlightGuard<'_>> {
        let mut boards = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !boards.insert(board_id.to_string()) {
            log::info!("Sync for board {} already running; skipping", board_id);
            return Err(SyncError::AlreadyInProgress(board_id.to_string()));
        }
        Ok(InFlightGuard {
            boards: &self.in_flight,
            board_id: board_id.to_string(),
        })
    }

    /// One push + pull cycle for `board_id`.
    ///
    /// Returns `AlreadyInProgress` immediately when a cycle for the same board
    /// is still running.
    pub async fn sync(&self, board_id: &str) -> SyncResult<SyncReport> {
        let _guard = self.begin(board_id)?;
        self.run_cycle(board_id, false).await
    }

    /// Like [`SyncCoordinator::sync`], and afterwards drops synced items the
    /// board no longer returns, provided the pull was not truncated
    pub async fn resync(&self, board_id: &str) -> SyncResult<SyncReport> {
        let _guard = self.begin(board_id)?;
        self.run_cycle(board_id, true).await
    }

    /// Push one dirty item right away, e.g. after a scan assignment.
    ///
    /// Uses the cached config; the item stays dirty on failure.
    pub async fn push_item(&self, board_id: &str, item_id: &str) -> SyncResult<()> {
        let config = self
            .store
            .config(board_id)
            .await
            .ok_or_else(|| SyncError::ConfigMissing(board_id.to_string()))?;
        let column = config
            .barcode_column()
            .ok_or_else(|| SyncError::ConfigMissing(board_id.to_string()))?;
        let item = self
            .store
            .get(board_id, item_id)
            .await
            .ok_or_else(|| SyncError::NotFound(item_id.to_string()))?;
        if !item.is_dirty() {
            return Ok(());
        }
        self.push_one(&item, column).await
    }

    async fn run_cycle(&self, board_id: &str, prune: bool) -> SyncResult<SyncReport> {
        log::info!("Starting sync for board {}", board_id);
        let config = self.resolve_config(board_id).await?;

        let failed_push_ids = self.push_dirty(&config).await?;

        let items = self
            .call(self.remote.fetch_items(board_id, self.settings.page_limit))
            .await?;
        let snapshot_len = items.len();
        let present: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();
        let updated_count = self.store.upsert(items).await;

        match self.call(self.remote.fetch_columns(board_id)).await {
            Ok(columns) => self.store.save_columns(board_id, columns).await,
            Err(e) if e.requires_login() => return Err(e),
            Err(e) => log::warn!("Column metadata for board {} unavailable: {}", board_id, e),
        }

        let removed_count = if prune && snapshot_len < self.settings.page_limit {
            self.store.remove_absent(board_id, &present).await
        } else {
            0
        };

        let status = if failed_push_ids.is_empty() {
            SyncStatus::Complete
        } else {
            SyncStatus::PartialPushFailure
        };
        let report = SyncReport {
            updated_count,
            failed_push_ids,
            status,
            removed_count,
            storage_degraded: self.store.is_degraded().await,
        };
        log::info!(
            "Sync for board {} done: {} updated, {} removed, {} push failures",
            board_id,
            report.updated_count,
            report.removed_count,
            report.failed_push_ids.len()
        );
        Ok(report)
    }

    /// Remote config first, cached config when the service has none or
    /// cannot be reached
    async fn resolve_config(&self, board_id: &str) -> SyncResult<Config> {
        match self.call(self.remote.fetch_configs(board_id)).await {
            Ok(configs) => match configs.into_iter().next() {
                Some(active) => {
                    self.store.save_config(active.clone()).await;
                    return Ok(active);
                }
                None => log::warn!("Board service returned no config for board {}", board_id),
            },
            Err(e) if e.requires_login() => return Err(e),
            Err(e) => log::warn!("Config fetch for board {} failed: {}; using cache", board_id, e),
        }

        self.store
            .config(board_id)
            .await
            .ok_or_else(|| SyncError::ConfigMissing(board_id.to_string()))
    }

    /// Push every dirty item in edit order; returns the ids that failed.
    /// An auth failure ends the phase at once.
    async fn push_dirty(&self, config: &Config) -> SyncResult<Vec<String>> {
        let dirty = self.store.get_dirty(&config.board_id).await;
        if dirty.is_empty() {
            return Ok(Vec::new());
        }

        let Some(column) = config.barcode_column() else {
            log::warn!(
                "Board {} has no barcode column; {} edits stay local",
                config.board_id,
                dirty.len()
            );
            return Ok(dirty.into_iter().map(|i| i.id).collect());
        };

        let mut failed = Vec::new();
        for item in &dirty {
            match self.push_one(item, column).await {
                Ok(()) => {}
                Err(e) if e.requires_login() => return Err(e),
                Err(e) => {
                    log::warn!("Push of item {} failed: {}", item.id, e);
                    failed.push(item.id.clone());
                }
            }
        }
        Ok(failed)
    }

    async fn push_one(&self, item: &Item, column: &str) -> SyncResult<()> {
        let barcode = item.value_of(column);
        self.call(self.remote.update_barcode(&item.id, barcode.trim()))
            .await?;
        if !self.store.confirm_pushed(&item.board_id, &item.id, item.updated_at).await {
            log::debug!("Item {} was edited during push; keeping it dirty", item.id);
        }
        Ok(())
    }

    /// Await one remote call under the request timeout and map its error.
    /// A rejected credential is dropped here.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, RemoteError>>,
    ) -> SyncResult<T> {
        let timeout = self.settings.request_timeout;
        let result = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                return Err(SyncError::Network(format!(
                    "request timed out after {}s",
                    timeout.as_secs_f32()
                )))
            }
        };
        result.map_err(|e| {
            if e.is_unauthorized() {
                self.credentials.invalidate();
            }
            SyncError::from(e)
        })
    }
}
