//! Migration discovery and ordering
//!
//! A migration's ordinal is the part of its file name before the first `-`,
//! parsed as an integer: `10-seed.sql` has ordinal 10. Names whose prefix is
//! not an integer are still listed, with no ordinal.

use crate::errors::{discovery_error, file_read_error, invalid_input, Result};
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How discovered migrations are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SortOrder {
    /// Valid ordinals ascending, then unparseable names by prefix
    #[default]
    #[serde(rename = "numeric", alias = "numeric-first")]
    NumericFirst,
    /// Raw file name, byte order
    #[serde(rename = "lexicographic", alias = "lex")]
    Lexicographic,
}

impl FromStr for SortOrder {
    type Err = migrun_core::ExError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" | "numeric-first" => Ok(SortOrder::NumericFirst),
            "lexicographic" | "lex" => Ok(SortOrder::Lexicographic),
            other => Err(invalid_input(format!(
                "unknown ordering '{}', expected 'numeric' or 'lexicographic'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::NumericFirst => f.write_str("numeric"),
            SortOrder::Lexicographic => f.write_str("lexicographic"),
        }
    }
}

/// One discovered migration script
///
/// The body is not loaded until [`MigrationFile::read_body`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    raw_name: String,
    ordinal: Option<i64>,
    path: PathBuf,
}

impl MigrationFile {
    pub fn new(raw_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let raw_name = raw_name.into();
        let ordinal = parse_ordinal(&raw_name);
        Self {
            raw_name,
            ordinal,
            path: path.into(),
        }
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// `None` when the prefix is not an integer
    pub fn ordinal(&self) -> Option<i64> {
        self.ordinal
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name portion before the first `-` (the whole name if there is none)
    pub fn prefix(&self) -> &str {
        name_prefix(&self.raw_name)
    }

    /// Read the full script
    pub fn read_body(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| file_read_error(&self.raw_name, &e))
    }
}

fn name_prefix(name: &str) -> &str {
    name.split_once('-').map_or(name, |(prefix, _)| prefix)
}

/// Parse the ordinal from a file name
pub fn parse_ordinal(name: &str) -> Option<i64> {
    name_prefix(name).parse::<i64>().ok()
}

/// List the migrations in `dir` (non-recursive), sorted by `order`
///
/// Subdirectories are ignored. Every call rereads the directory.
pub fn list_migrations(dir: &Path, order: SortOrder) -> Result<Vec<MigrationFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| discovery_error(dir, &e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| discovery_error(dir, &e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if is_directory(&entry) {
            tracing::debug!(entry = %name, "ignoring subdirectory in migrations directory");
            continue;
        }

        files.push(MigrationFile::new(name, path));
    }

    sort_migrations(&mut files, order);
    Ok(files)
}

// Only entries known to be directories are excluded; anything that cannot be
// stat'ed stays listed and fails when its body is read
fn is_directory(entry: &std::fs::DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_dir() => true,
        Ok(ft) if ft.is_symlink() => std::fs::metadata(entry.path())
            .map(|m| m.is_dir())
            .unwrap_or(false),
        _ => false,
    }
}

/// Sort in place; both orders are total, so the result is deterministic
pub fn sort_migrations(files: &mut [MigrationFile], order: SortOrder) {
    match order {
        SortOrder::NumericFirst => files.sort_by(compare_numeric_first),
        SortOrder::Lexicographic => files.sort_by(|a, b| a.raw_name.cmp(&b.raw_name)),
    }
}

fn compare_numeric_first(a: &MigrationFile, b: &MigrationFile) -> Ordering {
    match (a.ordinal, b.ordinal) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.raw_name.cmp(&b.raw_name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .prefix()
            .cmp(b.prefix())
            .then_with(|| a.raw_name.cmp(&b.raw_name)),
    }
}
