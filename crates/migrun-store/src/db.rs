//! Database connection management

use crate::errors::{connection_error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Open a SQLite database at the given path and verify it answers queries
///
/// The file is created if it does not exist.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "database file not found, creating it");
    }
    connect(path, OpenFlags::default())
}

/// Open an existing database without ever creating the file
pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Connection> {
    connect(
        path.as_ref(),
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn connect(path: &Path, flags: OpenFlags) -> Result<Connection> {
    let target = path.display().to_string();
    let conn =
        Connection::open_with_flags(path, flags).map_err(|e| connection_error(&target, &e))?;
    configure(&conn).map_err(|e| connection_error(&target, &e))?;
    ping(&conn).map_err(|e| connection_error(&target, &e))?;
    Ok(conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
}

/// Round-trip a trivial query
pub fn ping(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
}
