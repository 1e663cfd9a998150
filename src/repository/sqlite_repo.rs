//! SQLite Repository
//!
//! Durable cache backend. Items are stored one row per id with the full
//! payload serialized as JSON, so an offline restart loses nothing.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use super::db::open_connection;
use super::traits::Repository;
use crate::domain::{BoardColumn, Config, Item, SyncState};
use crate::error::SyncResult;

/// SQLite implementation of the cache repository
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Open the database file (or `:memory:`) and migrate it
    pub fn open(db_path: &Path) -> SyncResult<Self> {
        Ok(Self::new(open_connection(db_path)?))
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn load_items(&self) -> SyncResult<Vec<Item>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id, serialized_item, sync_state FROM items")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, payload, state) = row?;
            match row_to_item(&payload, &state) {
                Ok(item) => items.push(item),
                // One unreadable row must not take the whole cache down
                Err(e) => log::warn!("Skipping unreadable cached item {}: {}", id, e),
            }
        }
        Ok(items)
    }

    async fn save_items(&self, items: &[Item]) -> SyncResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO items (id, board_id, name, serialized_item, sync_state, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for item in items {
                stmt.execute(params![
                    item.id,
                    item.board_id,
                    item.name,
                    serde_json::to_string(item)?,
                    item.sync_state.as_str(),
                    item.updated_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn delete_items(&self, board_id: &str, ids: &[String]) -> SyncResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM items WHERE board_id = ?1 AND id = ?2")?;
            for id in ids {
                stmt.execute(params![board_id, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn load_configs(&self) -> SyncResult<Vec<Config>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT serialized_config FROM board_configs")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut configs = Vec::new();
        for payload in rows {
            configs.push(serde_json::from_str(&payload?)?);
        }
        Ok(configs)
    }

    async fn save_config(&self, config: &Config) -> SyncResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO board_configs (board_id, serialized_config, updated_at) VALUES (?1, ?2, ?3)",
            params![
                config.board_id,
                serde_json::to_string(config)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    async fn load_columns(&self) -> SyncResult<Vec<(String, Vec<BoardColumn>)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT board_id, serialized_columns FROM board_columns")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut boards = Vec::new();
        for row in rows {
            let (board_id, payload) = row?;
            boards.push((board_id, serde_json::from_str(&payload)?));
        }
        Ok(boards)
    }

    async fn save_columns(&self, board_id: &str, columns: &[BoardColumn]) -> SyncResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO board_columns (board_id, serialized_columns, updated_at) VALUES (?1, ?2, ?3)",
            params![board_id, serde_json::to_string(columns)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Decode a stored row; the `sync_state` column wins over the payload
fn row_to_item(payload: &str, sync_state: &str) -> SyncResult<Item> {
    let mut item: Item = serde_json::from_str(payload)?;
    item.sync_state = SyncState::from_str(sync_state);
    if item.sync_state == SyncState::Synced {
        item.dirty_columns.clear();
    }
    Ok(item)
}
