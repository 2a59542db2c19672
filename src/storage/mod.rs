//! Storage module for persisting crawl data
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - The response cache's persistent entries
//! - The progress store (which items are already completed)
//! - An in-memory backend with the same behaviour

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::{init_database, SqliteStorage};
pub use traits::{
    CacheBackend, CachedResponse, ProgressStore, ProgressValue, StorageBackend, StorageError,
    StorageResult,
};

use crate::HarvestError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}
