//! Barcode Resolution
//!
//! A scan either looks an item up (nothing selected) or assigns the code to
//! the selected item.

use crate::domain::{ColumnValue, Config, Item};
use crate::error::{SyncError, SyncResult};
use crate::sync::SyncCoordinator;

/// What happened to an assigned code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Pushed,
    /// Kept as a dirty edit for the next sync
    SavedLocally { reason: SyncError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found { item: Item },
    NotFound { column_id: String, code: String },
    Assigned { item: Item, delivery: Delivery },
}

/// First item whose search column equals `code` exactly, after trimming both
pub fn find_by_code<'a>(items: &'a [Item], config: &Config, code: &str) -> Option<&'a Item> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    let column = config.search_column();
    items.iter().find(|item| item.value_of(column).trim() == code)
}

/// Handle one scanned code for `board_id`.
///
/// With `selected` set the code is written to that item's barcode column and
/// pushed immediately; a failed push leaves the edit dirty and is reported
/// as [`Delivery::SavedLocally`], never as an error.
pub async fn handle_scan(
    sync: &SyncCoordinator,
    board_id: &str,
    selected: Option<&str>,
    code: &str,
) -> SyncResult<ScanOutcome> {
    let store = sync.store();
    let config = store
        .config(board_id)
        .await
        .unwrap_or_else(|| Config::new(board_id));

    let Some(item_id) = selected else {
        let items = store.get_all(board_id).await;
        return Ok(match find_by_code(&items, &config, code) {
            Some(item) => ScanOutcome::Found { item: item.clone() },
            None => ScanOutcome::NotFound {
                column_id: config.search_column().to_string(),
                code: code.trim().to_string(),
            },
        });
    };

    let column = config
        .barcode_column()
        .ok_or_else(|| SyncError::ConfigMissing(board_id.to_string()))?;
    let code = code.trim();
    if code.is_empty() {
        return Ok(ScanOutcome::NotFound {
            column_id: column.to_string(),
            code: String::new(),
        });
    }

    store
        .mark_dirty(board_id, item_id, column, ColumnValue::text(code))
        .await;
    let delivery = match sync.push_item(board_id, item_id).await {
        Ok(()) => Delivery::Pushed,
        Err(reason) => {
            log::warn!("Barcode for item {} saved locally: {}", item_id, reason);
            Delivery::SavedLocally { reason }
        }
    };

    let item = store
        .get(board_id, item_id)
        .await
        .ok_or_else(|| SyncError::NotFound(item_id.to_string()))?;
    Ok(ScanOutcome::Assigned { item, delivery })
}
