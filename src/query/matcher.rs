//! Text matching for the search box and the duplicate view.

use std::collections::HashMap;

use crate::domain::{Config, FilterState, Item, MatchType, SearchColumn, NAME_COLUMN};

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compare one extracted value against the folded search text
fn matches_value(value: &str, needle: &str, match_type: MatchType) -> bool {
    let value = fold(value);
    match match_type {
        MatchType::Contains => value.contains(needle),
        MatchType::Exact => value == needle,
        MatchType::NotEqual => value != needle,
        MatchType::DoesNotContain => !value.contains(needle),
        MatchType::IsEmpty => value.is_empty(),
        MatchType::IsNotEmpty => !value.is_empty(),
    }
}

/// Column compared when a specific column is chosen, else the board's search column
pub fn effective_search_column<'a>(filter: &'a FilterState, config: &'a Config) -> &'a str {
    match &filter.search_column {
        SearchColumn::Column(col) if !col.trim().is_empty() => col.trim(),
        _ => config.search_column(),
    }
}

/// Keep items whose effective search value occurs more than once
pub fn duplicates(items: Vec<Item>, column: &str) -> Vec<Item> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in &items {
        *counts.entry(fold(&item.value_of(column))).or_default() += 1;
    }
    items
        .into_iter()
        .filter(|item| {
            let key = fold(&item.value_of(column));
            !key.is_empty() && counts.get(&key).copied().unwrap_or(0) > 1
        })
        .collect()
}

/// Whether `item` passes the match filter.
///
/// Under `SearchColumn::All` the name and the board's search column are
/// checked together: positive tests pass if either column passes, negated
/// and emptiness-required tests only if both do.
pub fn matches(item: &Item, filter: &FilterState, config: &Config) -> bool {
    let match_type = filter.match_type;
    let needle = fold(&filter.search_text);
    if match_type.needs_operand() && needle.is_empty() {
        return true;
    }

    match &filter.search_column {
        SearchColumn::Column(col) if !col.trim().is_empty() => {
            matches_value(&item.value_of(col.trim()), &needle, match_type)
        }
        _ => {
            let mut columns = vec![NAME_COLUMN];
            let search = config.search_column();
            if search != NAME_COLUMN {
                columns.push(search);
            }
            let mut results = columns
                .into_iter()
                .map(|col| matches_value(&item.value_of(col), &needle, match_type));
            match match_type {
                MatchType::Contains | MatchType::Exact | MatchType::IsNotEmpty => {
                    results.any(|hit| hit)
                }
                MatchType::NotEqual | MatchType::DoesNotContain | MatchType::IsEmpty => {
                    results.all(|hit| hit)
                }
            }
        }
    }
}
