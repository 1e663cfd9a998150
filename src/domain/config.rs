//! Board Configuration
//!
//! Which columns of a board the scanner reads and writes, and how the list is
//! sorted by default.

use serde::{Deserialize, Serialize};

use super::item::NAME_COLUMN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

fn default_name_column() -> String {
    NAME_COLUMN.to_string()
}

/// Active scanner configuration for one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub board_id: String,
    /// Column receiving scanned codes; `None` when the admin has not picked one
    #[serde(default)]
    pub barcode_column_id: Option<String>,
    /// Column matched against scanned codes in search mode
    #[serde(default = "default_name_column")]
    pub search_column_id: String,
    #[serde(default)]
    pub display_column_ids: Vec<String>,
    #[serde(default = "default_name_column")]
    pub sort_field: String,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl Config {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            barcode_column_id: None,
            search_column_id: default_name_column(),
            display_column_ids: Vec::new(),
            sort_field: default_name_column(),
            sort_direction: SortDirection::Asc,
        }
    }

    pub fn with_barcode_column(mut self, column_id: impl Into<String>) -> Self {
        self.barcode_column_id = Some(column_id.into());
        self
    }

    pub fn with_search_column(mut self, column_id: impl Into<String>) -> Self {
        self.search_column_id = column_id.into();
        self
    }

    /// Barcode column, treating a blank id as unconfigured
    pub fn barcode_column(&self) -> Option<&str> {
        self.barcode_column_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Search column, falling back to `name` when blank
    pub fn search_column(&self) -> &str {
        let col = self.search_column_id.trim();
        if col.is_empty() {
            NAME_COLUMN
        } else {
            col
        }
    }
}

/// Column metadata of a board, used for titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
