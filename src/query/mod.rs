//! Query Engine
//!
//! Derives the visible list from the cached items and the filter sheet.
//! Pure and synchronous: same inputs, same ordered output.

mod columns;
mod matcher;
mod sort;
mod summary;

pub use columns::{available_columns, prettify, ColumnChoice};
pub use matcher::effective_search_column;
pub use sort::{compare_values, parse_numeric};
pub use summary::{summary, ScanSummary};

use crate::domain::{Config, FilterState, FilterStatus, Item};

/// Visible items for `filter`.
///
/// Stages run in a fixed order: duplicates, match, status, sort.
pub fn view(all_items: &[Item], filter: &FilterState, config: &Config) -> Vec<Item> {
    let mut items: Vec<Item> = all_items.to_vec();

    if filter.show_duplicates {
        let column = effective_search_column(filter, config);
        items = matcher::duplicates(items, column);
    }

    items.retain(|item| matcher::matches(item, filter, config));

    if let Some(barcode) = config.barcode_column() {
        match filter.filter_status {
            FilterStatus::All => {}
            FilterStatus::Assigned => items.retain(|i| !i.value_of(barcode).trim().is_empty()),
            FilterStatus::Missing => items.retain(|i| i.value_of(barcode).trim().is_empty()),
        }
    }

    sort::sort_items(items, &filter.sort_field, filter.sort_direction)
}
