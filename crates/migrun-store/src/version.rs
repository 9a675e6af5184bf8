//! Version record persistence
//!
//! The highest applied ordinal lives in a single-row table:
//! `migrations(last_migrated INTEGER)`. Only the maximum is tracked, so a
//! migration added later with an ordinal below the recorded value is
//! treated as already applied.

use crate::errors::{storage_error, Result};
use rusqlite::Connection;

/// Returned by [`current_version`] when the record is missing or unreadable
pub const UNKNOWN_VERSION: i64 = -1;

const INIT_SQL: &str = "
    CREATE TABLE IF NOT EXISTS migrations (last_migrated INTEGER);

    INSERT INTO migrations (last_migrated)
    SELECT 0
    WHERE NOT EXISTS (SELECT 1 FROM migrations);
";

/// Create the version table and its default row if absent
///
/// Safe to call on every startup.
pub fn ensure_initialized(conn: &Connection) -> Result<()> {
    conn.execute_batch(INIT_SQL)
        .map_err(|e| storage_error("ensure_initialized", &e))
}

/// Whether the version table exists
pub fn is_initialized(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'migrations')",
        [],
        |row| row.get::<_, bool>(0),
    )
    .map_err(|e| storage_error("is_initialized", &e))
}

/// Read `last_migrated`
///
/// Never fails: a missing table, missing row or non-integer value yields
/// [`UNKNOWN_VERSION`], which makes every migration pending.
pub fn current_version(conn: &Connection) -> i64 {
    match conn.query_row("SELECT last_migrated FROM migrations", [], |row| {
        row.get::<_, i64>(0)
    }) {
        Ok(version) => version,
        Err(err) => {
            tracing::debug!(error = %err, "version record unreadable");
            UNKNOWN_VERSION
        }
    }
}

/// Overwrite `last_migrated`
pub fn set_current_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute("UPDATE migrations SET last_migrated = ?1", [version])
        .map_err(|e| storage_error("set_current_version", &e))?;
    Ok(())
}
