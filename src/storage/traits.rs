//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage used after close")]
    Closed,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A response as kept by the response cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
    pub stored_at: DateTime<Utc>,
}

/// A value kept in the progress store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ProgressValue {
    /// Name of the variant as stored in the database
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
        }
    }

    /// Rebuilds a value from its stored kind and text form
    pub fn from_parts(kind: &str, value: &str) -> StorageResult<Self> {
        let invalid = || StorageError::Serialization(format!("bad {} value '{}'", kind, value));
        match kind {
            "bool" => value.parse().map(Self::Bool).map_err(|_| invalid()),
            "int" => value.parse().map(Self::Int).map_err(|_| invalid()),
            "text" => Ok(Self::Text(value.to_string())),
            other => Err(StorageError::Serialization(format!(
                "unknown progress value kind '{}'",
                other
            ))),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Persistent side of the response cache
///
/// Entries are keyed by (method, normalized URL). Expiry is decided by the
/// caller from `stored_at`; backends never purge on their own.
pub trait CacheBackend: Send + Sync {
    /// Looks up a stored response
    fn get_response(&self, method: &str, url: &str) -> StorageResult<Option<CachedResponse>>;

    /// Stores a response, replacing any previous entry for the key
    fn put_response(&self, method: &str, url: &str, response: &CachedResponse)
        -> StorageResult<()>;

    /// Counts stored responses
    fn count_responses(&self) -> StorageResult<u64>;
}

/// Key-value store recording which items have been completed
pub trait ProgressStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<ProgressValue>>;

    fn save(&self, key: &str, value: ProgressValue) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes every key
    fn clear(&self) -> StorageResult<()>;
}

/// A backend serving both the response cache and the progress store
pub trait StorageBackend: CacheBackend + ProgressStore {
    /// Flushes and releases the backend; later calls fail with `Closed`
    fn close(&self) -> StorageResult<()>;
}
