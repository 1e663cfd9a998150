//! Error Taxonomy
//!
//! Every failure of the store, the remote calls and the sync cycle maps to
//! exactly one `SyncError` kind.

use thiserror::Error;

use crate::remote::RemoteError;

/// Common result type for store and sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Local I/O fault; the store keeps running in memory
    #[error("local storage failure: {0}")]
    Storage(String),

    /// Unreachable service, timeout or unexpected response
    #[error("network failure: {0}")]
    Network(String),

    /// 401/403 from the board service; the credential has been dropped
    #[error("authorization expired (HTTP {status})")]
    AuthExpired { status: u16 },

    #[error("no active or cached configuration for board {0}")]
    ConfigMissing(String),

    /// Some dirty items could not be pushed and stay dirty
    #[error("{} item(s) failed to push", .0.len())]
    PartialPushFailure(Vec<String>),

    #[error("sync already in progress for board {0}")]
    AlreadyInProgress(String),

    #[error("item {0} not found")]
    NotFound(String),
}

impl SyncError {
    /// Transient failures are worth retrying on the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::PartialPushFailure(_) | SyncError::AlreadyInProgress(_)
        )
    }

    /// The user has to sign in again before anything else works
    pub fn requires_login(&self) -> bool {
        matches!(self, SyncError::AuthExpired { .. })
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Unauthorized(status) => SyncError::AuthExpired { status },
            other => SyncError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_map_to_kinds() {
        assert_eq!(
            SyncError::from(RemoteError::Unauthorized(403)),
            SyncError::AuthExpired { status: 403 }
        );
        let err = SyncError::from(RemoteError::Transport("connection refused".to_string()));
        assert!(matches!(err, SyncError::Network(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_partial_push_message_counts_items() {
        let err = SyncError::PartialPushFailure(vec!["1".into(), "2".into()]);
        assert_eq!(err.to_string(), "2 item(s) failed to push");
        assert!(!SyncError::ConfigMissing("b".into()).is_transient());
    }
}
