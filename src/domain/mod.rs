//! Domain Layer
//!
//! Items, board configuration and filter settings.
//! This layer has NO external dependencies (except serde and chrono).

mod config;
mod filter;
mod item;

pub use config::{BoardColumn, Config, SortDirection};
pub use filter::{FilterState, FilterStatus, MatchType, SearchColumn};
pub use item::{Asset, ColumnValue, Item, SyncState, NAME_COLUMN};
