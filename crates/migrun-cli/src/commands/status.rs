//! Status command: recorded version and per-file state, read-only

use super::TargetArgs;
use clap::Args;
use migrun_store::db;
use migrun_store::migrations::{MigrationRunner, Outcome, SkipReason};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

fn status_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Skipped(SkipReason::AlreadyApplied { .. }) | Outcome::Applied { .. } => "applied",
        Outcome::Pending { .. } => "pending",
        Outcome::Skipped(SkipReason::InvalidOrdinal) => "skipped",
    }
}

pub fn execute(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.target.resolve()?;
    let conn = db::open_existing(&config.database)?;
    let report = MigrationRunner::new(&config.migrations_dir)
        .with_order(config.ordering)
        .plan(&conn)?;

    if report.starting_version < 0 {
        println!("current version: none");
    } else {
        println!("current version: {}", report.starting_version);
    }
    for (file, outcome) in &report.outcomes {
        println!("{} [{}]", file.raw_name(), status_label(outcome));
    }

    Ok(())
}
