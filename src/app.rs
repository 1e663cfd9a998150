//! Client Wiring
//!
//! Builds the store, the board client and the coordinator from one
//! [`ClientConfig`], and exposes the operations a scanner screen needs.

use std::path::Path;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::domain::{BoardColumn, Config, FilterState, Item};
use crate::error::{SyncError, SyncResult};
use crate::query::{self, ColumnChoice, ScanSummary};
use crate::remote::{CredentialStore, HttpBoardClient, RemoteBoard};
use crate::repository::LocalStore;
use crate::scan::{self, ScanOutcome};
use crate::sync::{SyncCoordinator, SyncReport, SyncSettings};

const APP_NAME: &str = "ScanSync";

/// Everything one signed-in scanner session shares
pub struct ScanClient {
    sync: SyncCoordinator,
}

impl ScanClient {
    /// Wire the default stack: SQLite cache under `data_dir`, HTTP board
    /// client, rolling log when `log_dir` is set.
    pub async fn open(
        config: &ClientConfig,
        data_dir: &Path,
        credentials: Arc<dyn CredentialStore>,
    ) -> SyncResult<Self> {
        if let Some(log_dir) = &config.log_dir {
            // A host that already installed a logger keeps it
            if let Err(e) = rolling_logger::init_logger(log_dir.clone(), APP_NAME) {
                log::debug!("Rolling logger not installed: {}", e);
            }
        }

        let db_path = config.database_path_in(data_dir);
        let store = Arc::new(LocalStore::open(&db_path).await);
        if let Some(fault) = store.storage_fault().await {
            log::warn!("Starting with in-memory cache only: {}", fault);
        }

        let remote = HttpBoardClient::new(config, credentials.clone())
            .map_err(|e| SyncError::Network(e.to_string()))?;
        log::info!("Scan client ready against {}", config.api_base());

        Ok(Self::with_parts(
            store,
            Arc::new(remote),
            credentials,
            SyncSettings::from(config),
        ))
    }

    pub fn with_parts(
        store: Arc<LocalStore>,
        remote: Arc<dyn RemoteBoard>,
        credentials: Arc<dyn CredentialStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            sync: SyncCoordinator::new(store, remote, credentials, settings),
        }
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn store(&self) -> &LocalStore {
        self.sync.store()
    }

    pub async fn sync(&self, board_id: &str) -> SyncResult<SyncReport> {
        self.sync.sync(board_id).await
    }

    pub async fn resync(&self, board_id: &str) -> SyncResult<SyncReport> {
        self.sync.resync(board_id).await
    }

    pub async fn scan(
        &self,
        board_id: &str,
        selected: Option<&str>,
        code: &str,
    ) -> SyncResult<ScanOutcome> {
        scan::handle_scan(&self.sync, board_id, selected, code).await
    }

    /// Cached config, or a bare default when the board was never synced
    pub async fn board_config(&self, board_id: &str) -> Config {
        self.store()
            .config(board_id)
            .await
            .unwrap_or_else(|| Config::new(board_id))
    }

    /// Filter sheet defaults for a board
    pub async fn default_filter(&self, board_id: &str) -> FilterState {
        FilterState::for_config(&self.board_config(board_id).await)
    }

    /// Visible list of a board for the given filter
    pub async fn view(&self, board_id: &str, filter: &FilterState) -> Vec<Item> {
        let config = self.board_config(board_id).await;
        let items = self.store().get_all(board_id).await;
        query::view(&items, filter, &config)
    }

    pub async fn columns(&self, board_id: &str) -> Vec<ColumnChoice> {
        let config = self.board_config(board_id).await;
        let mut items = self.store().get_all(board_id).await;
        items.sort_by(|a, b| a.id.cmp(&b.id));
        let board_columns: Vec<BoardColumn> = self.store().columns(board_id).await;
        query::available_columns(&config, &items, &board_columns)
    }

    pub async fn summary(&self, board_id: &str) -> ScanSummary {
        let config = self.board_config(board_id).await;
        let items = self.store().get_all(board_id).await;
        query::summary(&items, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchType;
    use crate::remote::scripted::ScriptedBoard;
    use crate::remote::MemoryCredential;

    fn client() -> ScanClient {
        let config = Config::new("b")
            .with_barcode_column("barcode")
            .with_search_column("sku");
        let items = vec![
            Item::new("1", "b", "Drill").with_text("sku", "D-1").with_text("barcode", "111"),
            Item::new("2", "b", "Saw").with_text("sku", "S-1"),
        ];
        ScanClient::with_parts(
            Arc::new(LocalStore::in_memory()),
            Arc::new(ScriptedBoard::with_board(config, items)),
            Arc::new(MemoryCredential::new("token")),
            SyncSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_offline_reads_after_sync() {
        let client = client();
        client.sync("b").await.unwrap();

        let mut filter = client.default_filter("b").await;
        filter.match_type = MatchType::Exact;
        filter.search_text = "s-1".into();
        let visible = client.view("b", &filter).await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Saw");

        let summary = client.summary("b").await;
        assert_eq!((summary.total, summary.assigned, summary.progress_percent), (2, 1, 50));

        let titles: Vec<String> = client.columns("b").await.into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Barcode", "Sku"]);
    }

    #[tokio::test]
    async fn test_unsynced_board_has_defaults() {
        let client = client();
        assert_eq!(client.board_config("zzz").await, Config::new("zzz"));
        assert!(client.view("zzz", &FilterState::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_open_with_file_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new("http://127.0.0.1:9");
        let client = ScanClient::open(&config, dir.path(), Arc::new(MemoryCredential::default()))
            .await
            .unwrap();

        assert!(!client.store().is_degraded().await);
        assert!(dir.path().join("scan_sync.db").exists());
    }
}
