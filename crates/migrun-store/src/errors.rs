//! Error helpers for migrun-store
//!
//! Builds `ExError`s from driver and filesystem failures

use migrun_core::errors::{ExError, MigrateError};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Version table create/read/write failure
pub fn storage_error(op: &str, err: &rusqlite::Error) -> ExError {
    MigrateError::Storage {
        op: op.to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// Database could not be opened or pinged
pub fn connection_error(target: &str, err: &rusqlite::Error) -> ExError {
    MigrateError::Connection {
        target: target.to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// Migrations directory missing or unlistable
pub fn discovery_error(dir: &Path, err: &std::io::Error) -> ExError {
    MigrateError::Discovery {
        dir: dir.display().to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// A single migration script could not be read
pub fn file_read_error(migration: &str, err: &std::io::Error) -> ExError {
    MigrateError::FileRead {
        migration: migration.to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// A migration script was rejected by the database
pub fn execution_error(migration: &str, ordinal: i64, err: &rusqlite::Error) -> ExError {
    MigrateError::Execution {
        migration: migration.to_string(),
        ordinal,
        reason: err.to_string(),
    }
    .into()
}

/// Unrecognised user-supplied value
pub fn invalid_input(reason: impl Into<String>) -> ExError {
    MigrateError::InvalidInput {
        reason: reason.into(),
    }
    .into()
}
