//! Column choices offered on the sort and search pickers.

use serde::{Deserialize, Serialize};

use crate::domain::{BoardColumn, Config, Item};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChoice {
    pub id: String,
    pub title: String,
}

/// "serial_no" -> "Serial no"
pub fn prettify(column_id: &str) -> String {
    let mut chars = column_id.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.map(|c| if c == '_' { ' ' } else { c }))
            .collect(),
        None => String::new(),
    }
}

/// Columns the list can be sorted or searched by.
///
/// Uses the configured display columns, or the columns of the first item when
/// none are configured. Titles come from board metadata when known.
pub fn available_columns(
    config: &Config,
    items: &[Item],
    board_columns: &[BoardColumn],
) -> Vec<ColumnChoice> {
    let ids: Vec<String> = if !config.display_column_ids.is_empty() {
        config.display_column_ids.clone()
    } else {
        match items.first() {
            Some(sample) => sample.column_values.keys().cloned().collect(),
            None => return Vec::new(),
        }
    };

    ids.into_iter()
        .map(|id| {
            let title = board_columns
                .iter()
                .find(|c| c.id == id && !c.title.trim().is_empty())
                .map(|c| c.title.clone())
                .unwrap_or_else(|| prettify(&id));
            ColumnChoice { id, title }
        })
        .collect()
}
