// Integration tests for the migration engine
// Covers idempotence, ordering, version gating and fatal-abort containment

use migrun_core::ExErrorKind;
use migrun_store::migrations::{MigrationRunner, Outcome, SkipReason, SortOrder};
use migrun_store::version::{current_version, ensure_initialized, set_current_version};
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

const CREATE_USERS: &str = "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);";
const ADD_INDEX: &str = "CREATE INDEX idx_users_name ON users (name);";
const SEED: &str = "INSERT INTO users (name) VALUES ('ada'); INSERT INTO users (name) VALUES ('grace');";

fn write(dir: &Path, name: &str, sql: &str) {
    std::fs::write(dir.join(name), sql).unwrap();
}

// The three-file directory used by most scenarios
fn standard_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1-create_users.sql", CREATE_USERS);
    write(dir.path(), "2-add_index.sql", ADD_INDEX);
    write(dir.path(), "10-seed.sql", SEED);
    dir
}

// Runs the engine and returns the console lines it would print
fn run_lines(
    runner: &MigrationRunner,
    conn: &mut Connection,
) -> (Vec<String>, migrun_store::Result<migrun_store::MigrationReport>) {
    let mut lines = Vec::new();
    let result = runner.run(conn, |file, outcome| {
        lines.push(format!("{} [{}]", file.raw_name(), outcome.label()));
    });
    (lines, result)
}

fn user_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_fresh_database_applies_all_in_numeric_order() {
    // Given: an empty database and three migrations
    let dir = standard_dir();
    let mut conn = Connection::open_in_memory().unwrap();
    let runner = MigrationRunner::new(dir.path());

    // When: the engine runs
    let (lines, result) = run_lines(&runner, &mut conn);
    let report = result.unwrap();

    // Then: every file is applied, 10 after 2
    assert_eq!(
        lines,
        vec![
            "1-create_users.sql [done]",
            "2-add_index.sql [done]",
            "10-seed.sql [done]",
        ]
    );
    assert_eq!(report.applied(), 3);
    assert_eq!(report.starting_version, 0);
    assert_eq!(report.final_version, 10);
    assert_eq!(current_version(&conn), 10);
    assert_eq!(user_count(&conn), 2);
}

#[test]
fn test_second_run_skips_everything() {
    // Given: a database already migrated to 10
    let dir = standard_dir();
    let mut conn = Connection::open_in_memory().unwrap();
    let runner = MigrationRunner::new(dir.path());
    runner.run(&mut conn, |_, _| {}).unwrap();

    // When: the engine runs again
    let (lines, result) = run_lines(&runner, &mut conn);
    let report = result.unwrap();

    // Then: nothing is applied and the version is unchanged
    assert_eq!(
        lines,
        vec![
            "1-create_users.sql [skipped]",
            "2-add_index.sql [skipped]",
            "10-seed.sql [skipped]",
        ]
    );
    assert_eq!(report.applied(), 0);
    assert_eq!(report.final_version, 10);
    assert_eq!(current_version(&conn), 10);
    // Seed ran exactly once
    assert_eq!(user_count(&conn), 2);
}

#[test]
fn test_partial_version_applies_only_newer() {
    // Given: last_migrated = 2 and the users table already present
    let dir = standard_dir();
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_initialized(&conn).unwrap();
    conn.execute_batch(CREATE_USERS).unwrap();
    set_current_version(&conn, 2).unwrap();

    // When: the engine runs
    let (lines, result) = run_lines(&MigrationRunner::new(dir.path()), &mut conn);
    let report = result.unwrap();

    // Then: only 10-seed.sql runs
    assert_eq!(
        lines,
        vec![
            "1-create_users.sql [skipped]",
            "2-add_index.sql [skipped]",
            "10-seed.sql [done]",
        ]
    );
    assert_eq!(report.starting_version, 2);
    assert_eq!(current_version(&conn), 10);
    let outcomes: Vec<_> = report.outcomes.iter().map(|(_, o)| *o).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Skipped(SkipReason::AlreadyApplied { ordinal: 1 }),
            Outcome::Skipped(SkipReason::AlreadyApplied { ordinal: 2 }),
            Outcome::Applied { ordinal: 10 },
        ]
    );
}

#[test]
fn test_invalid_name_is_skipped_and_never_applied() {
    // Given: a file whose prefix is not numeric; executing it would fail
    let dir = standard_dir();
    write(dir.path(), "bad-name.sql", "THIS IS NOT SQL;");
    let mut conn = Connection::open_in_memory().unwrap();

    // When: the engine runs twice
    let runner = MigrationRunner::new(dir.path());
    let (lines, result) = run_lines(&runner, &mut conn);
    result.unwrap();
    let (second, result) = run_lines(&runner, &mut conn);
    let report = result.unwrap();

    // Then: it is reported as skipped after the valid files, version is 10
    assert_eq!(lines.last().map(String::as_str), Some("bad-name.sql [skipped]"));
    assert_eq!(lines.len(), 4);
    assert_eq!(second.len(), 4);
    assert_eq!(current_version(&conn), 10);
    let (file, outcome) = report.outcomes.last().unwrap();
    assert_eq!(file.raw_name(), "bad-name.sql");
    assert_eq!(*outcome, Outcome::Skipped(SkipReason::InvalidOrdinal));
}

#[test]
fn test_failure_aborts_and_keeps_prior_progress() {
    // Given: the second of three migrations is broken
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1-create_users.sql", CREATE_USERS);
    write(dir.path(), "2-broken.sql", "CREATE TABLE oops (;");
    write(dir.path(), "3-seed.sql", SEED);
    let mut conn = Connection::open_in_memory().unwrap();

    // When: the engine runs
    let (lines, result) = run_lines(&MigrationRunner::new(dir.path()), &mut conn);

    // Then: file 1 is reported, file 2 aborts the run, file 3 never runs
    assert_eq!(lines, vec!["1-create_users.sql [done]"]);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Execution);
    assert_eq!(err.migration(), Some("2-broken.sql"));
    assert_eq!(err.ordinal(), Some(2));

    // And: the version reflects file 1 only
    assert_eq!(current_version(&conn), 1);
    assert_eq!(user_count(&conn), 0);
}

#[test]
fn test_fixed_migration_resumes_after_failure() {
    // Given: a run that failed on 2-broken.sql
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1-create_users.sql", CREATE_USERS);
    write(dir.path(), "2-broken.sql", "CREATE TABLE oops (;");
    let mut conn = Connection::open_in_memory().unwrap();
    let runner = MigrationRunner::new(dir.path());
    assert!(runner.run(&mut conn, |_, _| {}).is_err());

    // When: the script is fixed and the engine reruns
    write(dir.path(), "2-broken.sql", ADD_INDEX);
    let (lines, result) = run_lines(&runner, &mut conn);
    result.unwrap();

    // Then: only the fixed script runs
    assert_eq!(
        lines,
        vec!["1-create_users.sql [skipped]", "2-broken.sql [done]"]
    );
    assert_eq!(current_version(&conn), 2);
}

#[test]
fn test_missing_directory_is_discovery_error_and_mutates_nothing() {
    // Given: a database at version 4 and no migrations directory
    let dir = TempDir::new().unwrap();
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_initialized(&conn).unwrap();
    set_current_version(&conn, 4).unwrap();

    // When: the engine runs
    let runner = MigrationRunner::new(dir.path().join("migrations"));
    let (lines, result) = run_lines(&runner, &mut conn);

    // Then: discovery fails before anything is attempted
    assert!(lines.is_empty());
    assert_eq!(result.unwrap_err().kind(), ExErrorKind::Discovery);
    assert_eq!(current_version(&conn), 4);
}

#[test]
fn test_lexicographic_order_still_records_highest() {
    // Given: lexicographic ordering puts 10 before 2
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1-create_users.sql", CREATE_USERS);
    write(dir.path(), "10-seed.sql", SEED);
    write(dir.path(), "2-add_index.sql", ADD_INDEX);
    let mut conn = Connection::open_in_memory().unwrap();

    // When: the engine runs
    let runner = MigrationRunner::new(dir.path()).with_order(SortOrder::Lexicographic);
    let (lines, result) = run_lines(&runner, &mut conn);
    let report = result.unwrap();

    // Then: files run in name order and the version never goes backwards
    assert_eq!(
        lines,
        vec![
            "1-create_users.sql [done]",
            "10-seed.sql [done]",
            "2-add_index.sql [done]",
        ]
    );
    assert_eq!(report.final_version, 10);
    assert_eq!(current_version(&conn), 10);
}

#[test]
fn test_plan_executes_nothing() {
    // Given: a fresh database
    let dir = standard_dir();
    let conn = Connection::open_in_memory().unwrap();

    // When: a plan is computed
    let report = MigrationRunner::new(dir.path()).plan(&conn).unwrap();

    // Then: all files are pending against version 0 and no table was created
    assert_eq!(report.pending(), 3);
    assert_eq!(report.starting_version, 0);
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

#[test]
fn test_plan_agrees_with_run_on_uninitialized_database() {
    // Given: a fresh database and a zero-ordinal migration
    let dir = TempDir::new().unwrap();
    write(dir.path(), "0-boot.sql", "CREATE TABLE boot (id INTEGER);");
    write(dir.path(), "1-create_users.sql", CREATE_USERS);
    let mut conn = Connection::open_in_memory().unwrap();
    let runner = MigrationRunner::new(dir.path());

    // When: a plan is computed, then the engine runs
    let plan = runner.plan(&conn).unwrap();
    let report = runner.run(&mut conn, |_, _| {}).unwrap();

    // Then: both gate against 0, so 0-boot.sql is skipped by both
    assert_eq!(plan.starting_version, report.starting_version);
    let planned: Vec<_> = plan.outcomes.iter().map(|(_, o)| *o).collect();
    assert_eq!(
        planned,
        vec![
            Outcome::Skipped(SkipReason::AlreadyApplied { ordinal: 0 }),
            Outcome::Pending { ordinal: 1 },
        ]
    );
    let ran: Vec<_> = report.outcomes.iter().map(|(_, o)| *o).collect();
    assert_eq!(
        ran,
        vec![
            Outcome::Skipped(SkipReason::AlreadyApplied { ordinal: 0 }),
            Outcome::Applied { ordinal: 1 },
        ]
    );
}

#[test]
fn test_unreadable_script_aborts_and_keeps_prior_progress() {
    // Given: file 1 is valid, file 2 is not UTF-8
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1-a.sql", CREATE_USERS);
    std::fs::write(dir.path().join("2-b.sql"), [0xffu8, 0xfe, 0xfd]).unwrap();
    write(dir.path(), "3-c.sql", SEED);
    let mut conn = Connection::open_in_memory().unwrap();

    // When: the engine runs
    let (lines, result) = run_lines(&MigrationRunner::new(dir.path()), &mut conn);

    // Then: the read failure names file 2 and file 1 stays recorded
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::FileRead);
    assert_eq!(err.migration(), Some("2-b.sql"));
    assert_eq!(lines, vec!["1-a.sql [done]"]);
    assert_eq!(current_version(&conn), 1);
    assert_eq!(user_count(&conn), 0);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_file_read_error() {
    // Given: a migration that is a symlink to a missing file
    let dir = TempDir::new().unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone.sql"), dir.path().join("1-link.sql"))
        .unwrap();
    let mut conn = Connection::open_in_memory().unwrap();

    // When: the engine runs
    let (lines, result) = run_lines(&MigrationRunner::new(dir.path()), &mut conn);

    // Then: the run fails on it instead of silently dropping it
    assert!(lines.is_empty());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::FileRead);
    assert_eq!(err.migration(), Some("1-link.sql"));
    assert_eq!(current_version(&conn), 0);
}

#[test]
fn test_plan_matches_partial_version() {
    let dir = standard_dir();
    let conn = Connection::open_in_memory().unwrap();
    ensure_initialized(&conn).unwrap();
    set_current_version(&conn, 2).unwrap();

    let report = MigrationRunner::new(dir.path()).plan(&conn).unwrap();

    assert_eq!(report.skipped(), 2);
    assert_eq!(report.pending(), 1);
    assert_eq!(report.outcomes[2].1, Outcome::Pending { ordinal: 10 });
    assert_eq!(current_version(&conn), 2);
}

#[test]
fn test_unreadable_version_treats_all_as_pending() {
    // Given: a corrupted version row
    let dir = TempDir::new().unwrap();
    write(dir.path(), "0-bootstrap.sql", "CREATE TABLE boot (id INTEGER);");
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_initialized(&conn).unwrap();
    conn.execute("UPDATE migrations SET last_migrated = NULL", [])
        .unwrap();

    // When: the engine runs
    let report = MigrationRunner::new(dir.path())
        .run(&mut conn, |_, _| {})
        .unwrap();

    // Then: ordinal 0 is applied and recorded
    assert_eq!(report.starting_version, -1);
    assert_eq!(report.applied(), 1);
    assert_eq!(current_version(&conn), 0);
}
