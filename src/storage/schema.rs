//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Cached HTTP responses, keyed by method and normalized URL
CREATE TABLE IF NOT EXISTS responses (
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (method, url)
);

-- Crawl progress (completed items and other markers)
CREATE TABLE IF NOT EXISTS progress (
    key TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
