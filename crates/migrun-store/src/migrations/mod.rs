//! Migration framework
//!
//! - `catalog`: discovery of `<ordinal>-<name>` scripts and their ordering
//! - `runner`: version-gated application, one transaction per script

mod catalog;
mod runner;

pub use catalog::{list_migrations, parse_ordinal, sort_migrations, MigrationFile, SortOrder};
pub use runner::{
    apply_migrations, MigrationReport, MigrationRunner, Outcome, SkipReason,
    DEFAULT_MIGRATIONS_DIR,
};
