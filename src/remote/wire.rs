//! Wire Decoding
//!
//! The board service is loose about shapes: ids arrive as numbers or strings,
//! item lists come bare or wrapped, and `column_values` is either a list of
//! `{id, text, value}` objects or a map keyed by column id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::RemoteError;
use crate::domain::{BoardColumn, ColumnValue, Config, Item, SortDirection};

fn id_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct WireItem {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    column_values: Value,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemsPayload {
    Bare(Vec<WireItem>),
    Wrapped { items: Vec<WireItem> },
}

fn decode_column_values(raw: Value) -> BTreeMap<String, ColumnValue> {
    let mut values = BTreeMap::new();
    match raw {
        Value::Array(entries) => {
            for entry in entries {
                let Value::Object(mut obj) = entry else {
                    continue;
                };
                let Some(id) = obj.remove("id").as_ref().and_then(id_string) else {
                    continue;
                };
                if let Some(value) = ColumnValue::from_json(Value::Object(obj)) {
                    values.insert(id, value);
                }
            }
        }
        Value::Object(map) => {
            for (id, raw_value) in map {
                if let Some(value) = ColumnValue::from_json(raw_value) {
                    values.insert(id, value);
                }
            }
        }
        _ => {}
    }
    values
}

impl WireItem {
    fn into_item(self, board_id: &str) -> Result<Item, RemoteError> {
        let id = id_string(&self.id)
            .ok_or_else(|| RemoteError::Decode(format!("item without usable id: {}", self.id)))?;
        let updated_at = self
            .updated_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let mut item = Item::new(id, board_id, self.name.unwrap_or_default());
        item.column_values = decode_column_values(self.column_values);
        item.updated_at = updated_at;
        Ok(item)
    }
}

/// Decode an items response, bare array or `{items: [...]}`
pub(crate) fn decode_items(board_id: &str, body: Value) -> Result<Vec<Item>, RemoteError> {
    let payload: ItemsPayload =
        serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let wire = match payload {
        ItemsPayload::Bare(items) | ItemsPayload::Wrapped { items } => items,
    };
    wire.into_iter().map(|w| w.into_item(board_id)).collect()
}

#[derive(Debug, Deserialize)]
struct WireConfig {
    board_id: Value,
    #[serde(default)]
    barcode_column_id: Option<String>,
    #[serde(default)]
    search_column_id: Option<String>,
    #[serde(default)]
    sort_column_id: Option<String>,
    #[serde(default)]
    sort_direction: Option<String>,
    #[serde(default)]
    display_column_ids: Option<Vec<String>>,
}

impl WireConfig {
    fn into_config(self) -> Option<Config> {
        let board_id = id_string(&self.board_id)?;
        let mut config = Config::new(board_id);
        config.barcode_column_id = self.barcode_column_id.filter(|c| !c.trim().is_empty());
        if let Some(search) = self.search_column_id.filter(|c| !c.trim().is_empty()) {
            config.search_column_id = search;
        }
        if let Some(sort) = self.sort_column_id.filter(|c| !c.trim().is_empty()) {
            config.sort_field = sort;
        }
        config.sort_direction = self
            .sort_direction
            .as_deref()
            .map(SortDirection::from_str)
            .unwrap_or_default();
        config.display_column_ids = self.display_column_ids.unwrap_or_default();
        Some(config)
    }
}

/// Decode the barcode configuration list and keep the entries of `board_id`.
///
/// The service answers `{}` instead of `[]` when nothing is configured.
/// Entries that do not decode or carry no usable board id are skipped.
pub(crate) fn decode_configs(board_id: &str, body: Value) -> Result<Vec<Config>, RemoteError> {
    let Value::Array(entries) = body else {
        return Ok(Vec::new());
    };
    let mut configs = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let wire: WireConfig = match serde_json::from_value(entry) {
            Ok(wire) => wire,
            Err(e) => {
                log::warn!("Skipping config entry {}: {}", index, e);
                continue;
            }
        };
        let Some(config) = wire.into_config() else {
            log::warn!("Skipping config entry {}: no board id", index);
            continue;
        };
        if config.board_id == board_id {
            configs.push(config);
        }
    }
    Ok(configs)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnsPayload {
    Bare(Vec<BoardColumn>),
    Wrapped { columns: Vec<BoardColumn> },
}

pub(crate) fn decode_columns(body: Value) -> Result<Vec<BoardColumn>, RemoteError> {
    let payload: ColumnsPayload =
        serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(match payload {
        ColumnsPayload::Bare(columns) | ColumnsPayload::Wrapped { columns } => columns,
    })
}
