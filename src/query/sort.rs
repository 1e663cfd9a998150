//! List Ordering
//!
//! Values compare numerically when both sides are numeric literals and as
//! case-folded text otherwise. That mixed rule is not transitive ("10" < "9a"
//! as text, "9" < "10" as numbers, "9a" > "9" as text), so ordering goes
//! through a merge sort that only ever asks "is right strictly before left".

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Item, SortDirection};

fn numeric_literal() -> Option<&'static Regex> {
    static NUMERIC: OnceLock<Option<Regex>> = OnceLock::new();
    NUMERIC
        .get_or_init(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").ok())
        .as_ref()
}

/// Parse `raw` if the whole trimmed string is a numeric literal
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !numeric_literal()?.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Precomputed comparison key of one sort value
#[derive(Debug, Clone)]
struct SortKey {
    numeric: Option<f64>,
    folded: String,
}

impl SortKey {
    fn new(raw: &str) -> Self {
        Self {
            numeric: parse_numeric(raw),
            folded: raw.trim().to_lowercase(),
        }
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a.numeric, b.numeric) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.folded.cmp(&b.folded),
    }
}

/// Compare two raw values under the mixed numeric/text rule
pub fn compare_values(a: &str, b: &str) -> Ordering {
    compare_keys(&SortKey::new(a), &SortKey::new(b))
}

/// Stable bottom-up merge sort of `0..keys.len()` by `cmp`.
///
/// Stability holds whatever `cmp` returns: the right run only goes first
/// when it compares strictly `Less`.
fn merge_sort_indices<K>(keys: &[K], cmp: impl Fn(&K, &K) -> Ordering) -> Vec<usize> {
    let len = keys.len();
    let mut src: Vec<usize> = (0..len).collect();
    let mut dst: Vec<usize> = vec![0; len];

    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right) = (start, mid);
            for slot in dst[start..end].iter_mut() {
                let take_right = right < end
                    && (left >= mid || cmp(&keys[src[right]], &keys[src[left]]) == Ordering::Less);
                if take_right {
                    *slot = src[right];
                    right += 1;
                } else {
                    *slot = src[left];
                    left += 1;
                }
            }
            start = end;
        }
        std::mem::swap(&mut src, &mut dst);
        width *= 2;
    }
    src
}

/// Order items by the extracted value of `field`
pub fn sort_items(items: Vec<Item>, field: &str, direction: SortDirection) -> Vec<Item> {
    let keys: Vec<SortKey> = items.iter().map(|i| SortKey::new(&i.value_of(field))).collect();
    let order = match direction {
        SortDirection::Asc => merge_sort_indices(&keys, compare_keys),
        SortDirection::Desc => merge_sort_indices(&keys, |a, b| compare_keys(b, a)),
    };

    let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(parse_numeric(" 42 "), Some(42.0));
        assert_eq!(parse_numeric("-3.5"), Some(-3.5));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric(".5"), Some(0.5));
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let items = vec![
            Item::new("1", "b", "ten").with_text("v", "10"),
            Item::new("2", "b", "nine").with_text("v", "9"),
        ];
        let sorted = sort_items(items, "v", SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["nine", "ten"]);
    }

    #[test]
    fn test_equal_values_keep_input_order() {
        let items = vec![
            Item::new("1", "b", "B").with_text("v", "2"),
            Item::new("2", "b", "A").with_text("v", "2"),
        ];
        let asc = sort_items(items.clone(), "v", SortDirection::Asc);
        assert_eq!(names(&asc), vec!["B", "A"]);

        let desc = sort_items(items, "v", SortDirection::Desc);
        assert_eq!(names(&desc), vec!["B", "A"]);
    }

    #[test]
    fn test_text_is_case_insensitive_and_desc_reverses() {
        let items = vec![
            Item::new("1", "b", "banana"),
            Item::new("2", "b", "Apple"),
            Item::new("3", "b", "cherry"),
        ];
        let asc = sort_items(items.clone(), "name", SortDirection::Asc);
        assert_eq!(names(&asc), vec!["Apple", "banana", "cherry"]);

        let desc = sort_items(items, "name", SortDirection::Desc);
        assert_eq!(names(&desc), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_mixed_values_do_not_panic() {
        let values = ["10", "9a", "9", "", "x", "-1", "1e2", "B", "b", "007"];
        let items: Vec<Item> = values
            .iter()
            .cycle()
            .take(97)
            .enumerate()
            .map(|(n, v)| Item::new(n.to_string(), "b", *v).with_text("v", *v))
            .collect();

        let sorted = sort_items(items.clone(), "v", SortDirection::Asc);
        assert_eq!(sorted.len(), items.len());
        assert_eq!(sort_items(items, "v", SortDirection::Asc), sorted);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values("9", "10"), Ordering::Less);
        assert_eq!(compare_values("10", "9a"), Ordering::Less);
        assert_eq!(compare_values("abc", "ABC"), Ordering::Equal);
    }
}
