//! Item Entity
//!
//! An inventory record mirrored from a remote board, plus the column value
//! shapes the board service hands out.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column id that resolves to `Item::name` instead of a column value
pub const NAME_COLUMN: &str = "name";

/// Whether the local copy carries an edit the remote has not confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Synced,
    Dirty,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Synced => "synced",
            SyncState::Dirty => "dirty",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "dirty" => SyncState::Dirty,
            _ => SyncState::Synced,
        }
    }
}

/// File or image attached to an asset column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Value of one column on one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnValue {
    Text { text: String },
    Structured {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        value: Option<serde_json::Value>,
    },
    Assets { assets: Vec<Asset> },
}

impl ColumnValue {
    pub fn text(text: impl Into<String>) -> Self {
        ColumnValue::Text { text: text.into() }
    }

    /// Decode the loose JSON shapes the board service uses.
    ///
    /// Strings, numbers and booleans become text, objects become structured
    /// values, arrays become asset lists. `null` means "no value".
    pub fn from_json(raw: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match raw {
            Value::Null => None,
            Value::String(s) => Some(ColumnValue::Text { text: s }),
            Value::Number(n) => Some(ColumnValue::Text { text: n.to_string() }),
            Value::Bool(b) => Some(ColumnValue::Text { text: b.to_string() }),
            Value::Object(mut map) => {
                let text = match map.remove("text") {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                let value = map.remove("value").filter(|v| !v.is_null());
                Some(ColumnValue::Structured { text, value })
            }
            Value::Array(entries) => {
                let assets = entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::String(name) => Asset { name, ..Default::default() },
                        other => serde_json::from_value(other).unwrap_or_default(),
                    })
                    .collect();
                Some(ColumnValue::Assets { assets })
            }
        }
    }

    /// The one place a column value is turned into display text.
    ///
    /// Structured values show `text` and fall back to `value`; asset lists
    /// show their names.
    pub fn display_text(&self) -> String {
        match self {
            ColumnValue::Text { text } => text.clone(),
            ColumnValue::Structured { text, value } => match text {
                Some(t) if !t.is_empty() => t.clone(),
                _ => match value {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                },
            },
            ColumnValue::Assets { assets } => assets
                .iter()
                .map(|a| a.name.as_str())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Inventory record cached per board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id, unique within the board
    pub id: String,
    pub board_id: String,
    pub name: String,
    #[serde(default)]
    pub column_values: BTreeMap<String, ColumnValue>,
    #[serde(default)]
    pub sync_state: SyncState,
    pub updated_at: DateTime<Utc>,
    /// Columns touched by the pending local edit; empty while synced
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dirty_columns: BTreeSet<String>,
}

impl Item {
    /// Create a synced item with no column values
    pub fn new(id: impl Into<String>, board_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            board_id: board_id.into(),
            name: name.into(),
            column_values: BTreeMap::new(),
            sync_state: SyncState::Synced,
            updated_at: Utc::now(),
            dirty_columns: BTreeSet::new(),
        }
    }

    pub fn with_value(mut self, column_id: impl Into<String>, value: ColumnValue) -> Self {
        self.column_values.insert(column_id.into(), value);
        self
    }

    pub fn with_text(self, column_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_value(column_id, ColumnValue::text(text))
    }

    /// Extracted value of a column; `name` maps to the item name, a missing
    /// column is the empty string
    pub fn value_of(&self, column_id: &str) -> String {
        if column_id == NAME_COLUMN {
            return self.name.clone();
        }
        self.column_values
            .get(column_id)
            .map(ColumnValue::display_text)
            .unwrap_or_default()
    }

    pub fn is_dirty(&self) -> bool {
        self.sync_state == SyncState::Dirty
    }

    /// Apply a local edit and flag it for push
    pub fn apply_edit(&mut self, column_id: &str, value: ColumnValue, at: DateTime<Utc>) {
        if column_id == NAME_COLUMN {
            self.name = value.display_text();
        } else {
            self.column_values.insert(column_id.to_string(), value);
        }
        self.dirty_columns.insert(column_id.to_string());
        self.sync_state = SyncState::Dirty;
        self.updated_at = at;
    }

    /// Remote confirmed the edit
    pub fn mark_synced(&mut self) {
        self.sync_state = SyncState::Synced;
        self.dirty_columns.clear();
    }

    /// True when `incoming` shows every locally edited column with the same
    /// text, i.e. the remote has caught up with the edit
    pub fn is_confirmed_by(&self, incoming: &Item) -> bool {
        !self.dirty_columns.is_empty()
            && self
                .dirty_columns
                .iter()
                .all(|col| self.value_of(col).trim() == incoming.value_of(col).trim())
    }

    /// Same name and column values, ignoring sync bookkeeping
    pub fn same_content(&self, other: &Item) -> bool {
        self.board_id == other.board_id
            && self.name == other.name
            && self.column_values == other.column_values
    }
}
