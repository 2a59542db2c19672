//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! The connection sits behind a mutex that is only held for the duration of a
//! single synchronous statement.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    CacheBackend, CachedResponse, ProgressStore, ProgressValue, StorageBackend, StorageError,
    StorageResult,
};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite storage backend
pub struct SqliteStorage {
    /// None once the storage has been closed
    conn: Mutex<Option<Connection>>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = init_database(path)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Runs a closure against the open connection
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))?;
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }
}

impl CacheBackend for SqliteStorage {
    fn get_response(&self, method: &str, url: &str) -> StorageResult<Option<CachedResponse>> {
        let row = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT status, body, stored_at FROM responses WHERE method = ?1 AND url = ?2",
                    params![method, url],
                    |row| {
                        Ok((
                            row.get::<_, u16>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((status, body, stored_at)) = row else {
            return Ok(None);
        };

        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
            .map_err(|e| StorageError::Serialization(format!("stored_at '{}': {}", stored_at, e)))?
            .with_timezone(&Utc);

        Ok(Some(CachedResponse {
            status,
            body,
            stored_at,
        }))
    }

    fn put_response(
        &self,
        method: &str,
        url: &str,
        response: &CachedResponse,
    ) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO responses (method, url, status, body, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(method, url) DO UPDATE SET
                    status = excluded.status,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                params![
                    method,
                    url,
                    response.status,
                    response.body,
                    response.stored_at.to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    fn count_responses(&self) -> StorageResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

impl ProgressStore for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<ProgressValue>> {
        let row = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT kind, value FROM progress WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            Ok(row)
        })?;

        row.map(|(kind, value)| ProgressValue::from_parts(&kind, &value))
            .transpose()
    }

    fn save(&self, key: &str, value: ProgressValue) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO progress (key, kind, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    kind = excluded.kind,
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value.kind(), value.to_string(), now],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM progress WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn clear(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM progress", [])?;
            Ok(())
        })
    }
}

impl StorageBackend for SqliteStorage {
    fn close(&self) -> StorageResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))?;

        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
                tracing::debug!("Closed SQLite storage");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
