//! migrun store - SQLite persistence and the migration engine
//!
//! Provides:
//! - Connection helpers (`db`)
//! - The single-row version record (`version`)
//! - Migration discovery, ordering and application (`migrations`)

pub mod db;
pub mod errors;
pub mod migrations;
pub mod version;

pub use errors::Result;
pub use migrations::{apply_migrations, MigrationFile, MigrationReport, MigrationRunner, SortOrder};
