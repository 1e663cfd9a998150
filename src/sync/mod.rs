//! Sync Layer
//!
//! Push local barcode edits, then pull the board, one cycle per board at a
//! time.

mod coordinator;


use std::time::Duration;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::SyncError;

pub use coordinator::SyncCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Complete,
    /// The pull ran, but some dirty items are still waiting to be pushed
    PartialPushFailure,
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records changed by the pull
    pub updated_count: usize,
    pub failed_push_ids: Vec<String>,
    pub status: SyncStatus,
    /// Synced records pruned because the board no longer has them
    pub removed_count: usize,
    /// Local storage fell back to memory at some point this session
    pub storage_degraded: bool,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.status == SyncStatus::Complete
    }

    /// The partial push failure as an error value, if any
    pub fn error(&self) -> Option<SyncError> {
        match self.status {
            SyncStatus::Complete => None,
            SyncStatus::PartialPushFailure => {
                Some(SyncError::PartialPushFailure(self.failed_push_ids.clone()))
            }
        }
    }
}

/// Limits applied to every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub page_limit: usize,
    /// Upper bound for each remote call
    pub request_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_limit: 1000,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ClientConfig> for SyncSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_limit: config.page_limit.max(1),
            request_timeout: config.request_timeout(),
        }
    }
}
