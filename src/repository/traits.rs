//! Repository Layer - Core Traits
//!
//! Durable backend behind the local store.
//! Implementations can use SQLite, a test double, etc.

use async_trait::async_trait;

use crate::domain::{BoardColumn, Config, Item};
use crate::error::SyncResult;

/// Persistence contract for the local cache
///
/// The store keeps its own in-memory mirror, so a backend only has to load
/// everything once at startup and accept writes afterwards.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All cached items of every board
    async fn load_items(&self) -> SyncResult<Vec<Item>>;

    /// Insert or replace items by board and id, atomically
    async fn save_items(&self, items: &[Item]) -> SyncResult<()>;

    async fn delete_items(&self, board_id: &str, ids: &[String]) -> SyncResult<()>;

    async fn load_configs(&self) -> SyncResult<Vec<Config>>;

    async fn save_config(&self, config: &Config) -> SyncResult<()>;

    /// Column metadata keyed by board id
    async fn load_columns(&self) -> SyncResult<Vec<(String, Vec<BoardColumn>)>>;

    async fn save_columns(&self, board_id: &str, columns: &[BoardColumn]) -> SyncResult<()>;
}
