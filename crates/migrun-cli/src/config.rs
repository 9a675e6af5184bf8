//! Runner configuration
//!
//! Resolution order: an explicit `--config` file, else `database.toml` in the
//! working directory, else `MIGRUN_*` environment variables. Command-line
//! flags override whatever was loaded.

use migrun_core::errors::{ExError, MigrateError};
use migrun_store::migrations::{SortOrder, DEFAULT_MIGRATIONS_DIR};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "database.toml";

pub const ENV_DB_PATH: &str = "MIGRUN_DB_PATH";
pub const ENV_MIGRATIONS_DIR: &str = "MIGRUN_MIGRATIONS_DIR";
pub const ENV_ORDERING: &str = "MIGRUN_ORDERING";

/// Settings as read from a file or the environment; every field optional
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub migrations: MigrationSettings,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationSettings {
    pub dir: Option<PathBuf>,
    pub ordering: Option<SortOrder>,
}

/// Values supplied on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub ordering: Option<SortOrder>,
}

/// Fully resolved configuration handed to the commands
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub database: PathBuf,
    pub migrations_dir: PathBuf,
    pub ordering: SortOrder,
}

fn config_error(reason: impl Into<String>) -> ExError {
    MigrateError::Configuration {
        reason: reason.into(),
    }
    .into()
}

/// Parse settings from TOML text
pub fn parse_settings(text: &str, origin: &Path) -> Result<Settings, ExError> {
    toml::from_str(text).map_err(|e| config_error(format!("{}: {}", origin.display(), e)))
}

/// Read settings from a TOML file
pub fn from_file(path: &Path) -> Result<Settings, ExError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("cannot read {}: {}", path.display(), e)))?;
    let settings = parse_settings(&text, path)?;
    tracing::info!(path = %path.display(), "loaded configuration file");
    Ok(settings)
}

/// Build settings from environment variables looked up through `lookup`
pub fn from_env<F>(lookup: F) -> Result<Settings, ExError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let ordering = non_empty(ENV_ORDERING)
        .map(|v| v.parse::<SortOrder>())
        .transpose()
        .map_err(|e| config_error(format!("{}: {}", ENV_ORDERING, e.message())))?;

    Ok(Settings {
        database: DatabaseSettings {
            path: non_empty(ENV_DB_PATH).map(PathBuf::from),
        },
        migrations: MigrationSettings {
            dir: non_empty(ENV_MIGRATIONS_DIR).map(PathBuf::from),
            ordering,
        },
    })
}

/// Load settings following the resolution order
pub fn load(explicit: Option<&Path>) -> Result<Settings, ExError> {
    if let Some(path) = explicit {
        return from_file(path);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return from_file(default_path);
    }

    tracing::debug!("no configuration file, reading environment");
    from_env(|key| std::env::var(key).ok())
}

/// Apply command-line overrides and defaults
pub fn resolve(settings: Settings, overrides: Overrides) -> Result<RunConfig, ExError> {
    let database = overrides
        .database
        .or(settings.database.path)
        .ok_or_else(|| {
            config_error(format!(
                "no database path: set [database] path in {}, {} or pass --database",
                DEFAULT_CONFIG_FILE, ENV_DB_PATH
            ))
        })?;

    Ok(RunConfig {
        database,
        migrations_dir: overrides
            .dir
            .or(settings.migrations.dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_DIR)),
        ordering: overrides
            .ordering
            .or(settings.migrations.ordering)
            .unwrap_or_default(),
    })
}
