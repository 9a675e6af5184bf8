//! migrun CLI
//!
//! Applies `<ordinal>-<name>` SQL scripts to a SQLite database exactly once

use clap::{Parser, Subcommand, ValueEnum};
use migrun_core::logging_facility::{init, Profile};

mod commands;
mod config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "migrun")]
#[command(about = "migrun - apply versioned SQL migrations exactly once", long_about = None)]
struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Show the recorded version and each migration's state
    Status(commands::status::StatusArgs),
}

fn main() {
    let cli = Cli::parse();

    // A missing .env is normal
    dotenvy::dotenv().ok();

    init(match cli.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Status(args) => commands::status::execute(args),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
