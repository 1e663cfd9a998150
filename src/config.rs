//! Client Configuration
//!
//! Connection settings of the scanner client, persisted as
//! `client_config.json` next to the local database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

pub const CONFIG_FILE_NAME: &str = "client_config.json";

const DEFAULT_DB_FILE: &str = "scan_sync.db";

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_limit() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root, without the `/api/v1` suffix
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum items requested per board pull
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Rolling log directory; logging is left to the host when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
            database_path: None,
            log_dir: None,
        }
    }

    /// `{base_url}/api/v1`
    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.base_url.trim().trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Database file, defaulting to `scan_sync.db` inside `data_dir`
    pub fn database_path_in(&self, data_dir: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir.join(DEFAULT_DB_FILE))
    }

    /// Read `client_config.json` from `dir`; `None` when it was never saved
    pub fn load(dir: &Path) -> SyncResult<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    pub fn save(&self, dir: &Path) -> SyncResult<()> {
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE_NAME), content)?;
        log::info!("Saved client configuration to {}", dir.display());
        Ok(())
    }
}
