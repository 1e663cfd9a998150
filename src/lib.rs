//! Scan-Sync
//!
//! Offline-first core of a barcode scanner client for remote inventory boards.
//!
//! Layered architecture:
//! - domain: Items, board configuration and filter settings
//! - repository: Durable item cache with explicit sync state
//! - remote: Board service contract and its HTTP adapter
//! - sync: Push/pull reconciliation per board
//! - query: Filtering, duplicate detection and ordering of the cached list
//! - scan: Resolving or assigning scanned codes

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod remote;
pub mod repository;
pub mod scan;
pub mod sync;

pub use app::ScanClient;
pub use config::ClientConfig;
pub use error::{SyncError, SyncResult};
pub use repository::LocalStore;
pub use sync::{SyncCoordinator, SyncReport, SyncStatus};
