//! Database Connection and Setup
//!
//! Opens the SQLite cache file and runs migrations.

use std::path::Path;

use rusqlite::Connection;

use crate::error::SyncResult;

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Open the cache database at `db_path`, creating parent directories
pub fn open_connection(db_path: &Path) -> SyncResult<Connection> {
    let conn = if db_path.as_os_str() == IN_MEMORY {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        // WAL keeps readers off the writer's back; the pragma answers with a row
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn
    };

    run_migrations(&conn)?;
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> SyncResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Primary key columns of a table, in key order
fn primary_key_columns(conn: &Connection, table: &str) -> SyncResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(1)?, row.get::<_, i64>(5)?))
    })?;
    let mut keyed = Vec::new();
    for row in rows {
        let (name, position) = row?;
        if position > 0 {
            keyed.push((position, name));
        }
    }
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

const CREATE_ITEMS: &str = "CREATE TABLE IF NOT EXISTS items (
    id TEXT NOT NULL,
    board_id TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    serialized_item TEXT NOT NULL,
    sync_state TEXT NOT NULL DEFAULT 'synced',
    updated_at TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (board_id, id)
)";

/// Run database migrations
fn run_migrations(conn: &Connection) -> SyncResult<()> {
    // One row per item and board; serialized_item holds the full payload
    conn.execute(CREATE_ITEMS, [])?;

    // Caches written before timestamps were tracked lack this column
    if !column_exists(conn, "items", "updated_at")? {
        conn.execute(
            "ALTER TABLE items ADD COLUMN updated_at TEXT NOT NULL DEFAULT ''",
            [],
        )?;
    }

    // Older caches keyed items by id alone; rebuild with the board in the key
    if primary_key_columns(conn, "items")? == ["id"] {
        log::info!("Migrating items table to per-board keys");
        conn.execute_batch(&format!(
            "BEGIN;
             DROP INDEX IF EXISTS idx_items_board;
             ALTER TABLE items RENAME TO items_legacy;
             {CREATE_ITEMS};
             INSERT OR REPLACE INTO items (id, board_id, name, serialized_item, sync_state, updated_at)
                 SELECT id, board_id, name, serialized_item, sync_state, updated_at FROM items_legacy;
             DROP TABLE items_legacy;
             COMMIT;"
        ))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_board ON items(board_id, sync_state)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS board_configs (
            board_id TEXT PRIMARY KEY,
            serialized_config TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS board_columns (
            board_id TEXT PRIMARY KEY,
            serialized_columns TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
