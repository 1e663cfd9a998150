//! Repository Layer
//!
//! Local cache abstractions and implementations.

mod db;
mod local_store;
mod sqlite_repo;
mod traits;

#[cfg(test)]
mod tests;

pub use db::IN_MEMORY;
pub use local_store::LocalStore;
pub use sqlite_repo::SqliteRepository;
pub use traits::Repository;
