//! Remote Board Service
//!
//! The authoritative board service as seen by the sync coordinator, plus the
//! default HTTP adapter.

mod credential;
mod http;
mod wire;

#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{BoardColumn, Config, Item};

pub use credential::{CredentialStore, MemoryCredential};
pub use http::HttpBoardClient;

/// Failure of one remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 401 or 403: the credential is no longer accepted
    #[error("unauthorized (HTTP {0})")]
    Unauthorized(u16),

    /// Connection refused, DNS failure, timeout...
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => RemoteError::Unauthorized(status),
            _ => RemoteError::Status {
                status,
                message: message.into(),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized(_))
    }
}

/// Board service contract
///
/// Every call carries the externally supplied bearer credential.
#[async_trait]
pub trait RemoteBoard: Send + Sync {
    /// Scanner configurations of the board; the first one is active
    async fn fetch_configs(&self, board_id: &str) -> Result<Vec<Config>, RemoteError>;

    /// Current items of the board, at most `limit`
    async fn fetch_items(&self, board_id: &str, limit: usize) -> Result<Vec<Item>, RemoteError>;

    /// Column metadata of the board
    async fn fetch_columns(&self, board_id: &str) -> Result<Vec<BoardColumn>, RemoteError>;

    /// Write `barcode` into the configured barcode column of one item
    async fn update_barcode(&self, item_id: &str, barcode: &str) -> Result<(), RemoteError>;
}
