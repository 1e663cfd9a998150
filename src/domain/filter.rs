//! Filter State
//!
//! Client-local list settings chosen on the filter sheet. Never sent to the
//! board service.

use serde::{Deserialize, Serialize};

use super::config::{Config, SortDirection};

/// Which column the search box compares against.
///
/// Stored as a plain string: `"all"` or the column id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SearchColumn {
    /// `name` and the configured search column together
    #[default]
    All,
    Column(String),
}

impl SearchColumn {
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "" | "all" => SearchColumn::All,
            col => SearchColumn::Column(col.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchColumn::All => "all",
            SearchColumn::Column(col) => col,
        }
    }
}

impl From<String> for SearchColumn {
    fn from(s: String) -> Self {
        SearchColumn::from_str(&s)
    }
}

impl From<SearchColumn> for String {
    fn from(column: SearchColumn) -> Self {
        column.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    #[default]
    All,
    /// Barcode column has a value
    Assigned,
    /// Barcode column is empty
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    NotEqual,
    DoesNotContain,
    IsEmpty,
    IsNotEmpty,
}

impl MatchType {
    /// Match types that compare against the search text
    pub fn needs_operand(&self) -> bool {
        !matches!(self, MatchType::IsEmpty | MatchType::IsNotEmpty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search_column: SearchColumn,
    #[serde(default)]
    pub search_text: String,
    pub sort_field: String,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub filter_status: FilterStatus,
    #[serde(default)]
    pub show_duplicates: bool,
    #[serde(default)]
    pub match_type: MatchType,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_column: SearchColumn::All,
            search_text: String::new(),
            sort_field: super::item::NAME_COLUMN.to_string(),
            sort_direction: SortDirection::Asc,
            filter_status: FilterStatus::All,
            show_duplicates: false,
            match_type: MatchType::Contains,
        }
    }
}

impl FilterState {
    /// Initial state for a freshly loaded board: sorted as the admin configured
    pub fn for_config(config: &Config) -> Self {
        Self {
            sort_field: config.sort_field.clone(),
            sort_direction: config.sort_direction,
            ..Self::default()
        }
    }
}
