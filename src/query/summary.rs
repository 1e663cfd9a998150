//! Scan progress for one board.

use serde::{Deserialize, Serialize};

use crate::domain::{Config, Item};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScanSummary {
    pub total: usize,
    /// Items with a non-empty barcode
    pub assigned: usize,
    pub remaining: usize,
    /// Items carrying an unpushed edit
    pub pending_sync: usize,
    /// Rounded share of assigned items, 0 for an empty board
    pub progress_percent: u8,
}

pub fn summary(items: &[Item], config: &Config) -> ScanSummary {
    let total = items.len();
    let assigned = match config.barcode_column() {
        Some(col) => items
            .iter()
            .filter(|item| !item.value_of(col).trim().is_empty())
            .count(),
        None => 0,
    };
    let pending_sync = items.iter().filter(|item| item.is_dirty()).count();
    let progress_percent = if total == 0 {
        0
    } else {
        ((assigned as f64 / total as f64) * 100.0).round() as u8
    };

    ScanSummary {
        total,
        assigned,
        remaining: total - assigned,
        pending_sync,
        progress_percent,
    }
}
