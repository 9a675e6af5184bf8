//! Migrate command
//!
//! Usage: migrun migrate [--database <PATH>] [--dir <PATH>] [--dry-run]

use super::TargetArgs;
use clap::Args;
use migrun_store::db;
use migrun_store::migrations::MigrationRunner;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// List what would run without executing anything; the database must exist
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.target.resolve()?;
    let runner = MigrationRunner::new(&config.migrations_dir).with_order(config.ordering);

    if args.dry_run {
        let conn = db::open_existing(&config.database)?;
        println!("Running migrations");
        let report = runner.plan(&conn)?;
        for (file, outcome) in &report.outcomes {
            println!("{} [{}]", file.raw_name(), outcome.label());
        }
        return Ok(());
    }

    let mut conn = db::open(&config.database)?;
    println!("Running migrations");
    let report = runner.run(&mut conn, |file, outcome| {
        println!("{} [{}]", file.raw_name(), outcome.label());
    })?;

    tracing::info!(
        applied = report.applied(),
        skipped = report.skipped(),
        version = report.final_version,
        database = %config.database.display(),
        "migrate finished"
    );

    Ok(())
}
