//! Migration runner
//!
//! Applies every migration whose ordinal exceeds the recorded version, in
//! catalog order. Each migration's SQL and the version update commit in one
//! transaction, so a failure never leaves the counter ahead of the schema.

use crate::errors::{execution_error, storage_error, Result};
use crate::migrations::catalog::{list_migrations, MigrationFile, SortOrder};
use crate::version;
use migrun_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directory searched when none is configured
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Why a migration was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Ordinal is at or below the version recorded at the start of the run
    AlreadyApplied { ordinal: i64 },
    /// Name prefix is not an integer
    InvalidOrdinal,
}

/// What happened (or would happen) to one migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied { ordinal: i64 },
    /// Would be applied; only produced by [`MigrationRunner::plan`]
    Pending { ordinal: i64 },
    Skipped(SkipReason),
}

impl Outcome {
    /// Console tag: `done`, `pending` or `skipped`
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Applied { .. } => "done",
            Outcome::Pending { .. } => "pending",
            Outcome::Skipped(_) => "skipped",
        }
    }
}

/// Per-file outcomes of one run, in catalog order
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub starting_version: i64,
    pub final_version: i64,
    pub outcomes: Vec<(MigrationFile, Outcome)>,
}

impl MigrationReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied { .. }))
    }

    pub fn pending(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Pending { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Applies the migrations found in one directory
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    dir: PathBuf,
    order: SortOrder,
}

impl MigrationRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            order: SortOrder::default(),
        }
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Apply all pending migrations
    ///
    /// `on_progress` is called once per discovered file, in catalog order,
    /// as soon as its outcome is known. The first read or execution failure
    /// aborts the run: earlier migrations stay committed, later ones are not
    /// attempted, and the error names the failing file.
    pub fn run<F>(&self, conn: &mut Connection, mut on_progress: F) -> Result<MigrationReport>
    where
        F: FnMut(&MigrationFile, &Outcome),
    {
        version::ensure_initialized(conn)?;
        let starting_version = version::current_version(conn);
        let files = list_migrations(&self.dir, self.order)?;

        tracing::info!(
            dir = %self.dir.display(),
            order = %self.order,
            version = starting_version,
            discovered = files.len(),
            "running migrations"
        );

        let mut highest_applied: Option<i64> = None;
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let outcome = match gate(&file, starting_version) {
                Err(reason) => Outcome::Skipped(reason),
                Ok(ordinal) => {
                    let new_version = highest_applied.map_or(ordinal, |h| h.max(ordinal));
                    apply_one(conn, &file, ordinal, new_version)?;
                    highest_applied = Some(new_version);
                    Outcome::Applied { ordinal }
                }
            };

            on_progress(&file, &outcome);
            outcomes.push((file, outcome));
        }

        let final_version = highest_applied.unwrap_or(starting_version);
        tracing::info!(
            from = starting_version,
            to = final_version,
            "migrations complete"
        );

        Ok(MigrationReport {
            starting_version,
            final_version,
            outcomes,
        })
    }

    /// Compute what [`run`](Self::run) would do, without touching the database
    ///
    /// The version table is not created. A database that was never
    /// initialized is planned against the 0 that `run` would record first.
    pub fn plan(&self, conn: &Connection) -> Result<MigrationReport> {
        let starting_version = if version::is_initialized(conn)? {
            version::current_version(conn)
        } else {
            0
        };
        let files = list_migrations(&self.dir, self.order)?;

        let outcomes = files
            .into_iter()
            .map(|file| {
                let outcome = match gate(&file, starting_version) {
                    Ok(ordinal) => Outcome::Pending { ordinal },
                    Err(reason) => Outcome::Skipped(reason),
                };
                (file, outcome)
            })
            .collect();

        Ok(MigrationReport {
            starting_version,
            final_version: starting_version,
            outcomes,
        })
    }
}

/// The ordinal to apply, or why `file` is skipped given the version at run start
fn gate(file: &MigrationFile, version: i64) -> std::result::Result<i64, SkipReason> {
    match file.ordinal() {
        None => {
            tracing::warn!(
                migration = file.raw_name(),
                "migration name has no integer prefix before '-'; it will never be applied"
            );
            Err(SkipReason::InvalidOrdinal)
        }
        Some(ordinal) if ordinal <= version => Err(SkipReason::AlreadyApplied { ordinal }),
        Some(ordinal) => Ok(ordinal),
    }
}

fn apply_one(
    conn: &mut Connection,
    file: &MigrationFile,
    ordinal: i64,
    new_version: i64,
) -> Result<()> {
    let start = Instant::now();
    log_op_start!("apply_migration", migration = file.raw_name(), ordinal = ordinal);

    let result = execute_in_transaction(conn, file, ordinal, new_version);
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(()) => {
            log_op_end!(
                "apply_migration",
                duration_ms = duration_ms,
                migration = file.raw_name(),
                ordinal = ordinal
            );
        }
        Err(err) => {
            log_op_error!(
                "apply_migration",
                err.clone(),
                duration_ms = duration_ms,
                migration = file.raw_name(),
                ordinal = ordinal
            );
        }
    }

    result
}

fn execute_in_transaction(
    conn: &mut Connection,
    file: &MigrationFile,
    ordinal: i64,
    new_version: i64,
) -> Result<()> {
    let sql = file.read_body()?;

    let tx = conn
        .transaction()
        .map_err(|e| storage_error("begin_migration", &e))?;

    tx.execute_batch(&sql)
        .map_err(|e| execution_error(file.raw_name(), ordinal, &e))?;

    version::set_current_version(&tx, new_version)?;

    tx.commit()
        .map_err(|e| storage_error("commit_migration", &e))?;

    Ok(())
}

/// Apply the migrations in `dir` with the default ordering, discarding progress
pub fn apply_migrations(conn: &mut Connection, dir: &Path) -> Result<MigrationReport> {
    MigrationRunner::new(dir).run(conn, |_, _| {})
}
