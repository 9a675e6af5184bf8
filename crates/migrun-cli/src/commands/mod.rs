pub mod migrate;
pub mod status;

use crate::config::{self, Overrides, RunConfig};
use clap::{Args, ValueEnum};
use migrun_core::ExError;
use migrun_store::migrations::SortOrder;
use std::path::PathBuf;

/// Ordering accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingArg {
    /// Ordinal ascending; unparseable names last
    Numeric,
    /// Raw file name
    Lexicographic,
}

impl From<OrderingArg> for SortOrder {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Numeric => SortOrder::NumericFirst,
            OrderingArg::Lexicographic => SortOrder::Lexicographic,
        }
    }
}

/// Flags shared by every command that touches a database
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Configuration file (defaults to ./database.toml, then MIGRUN_* variables)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory holding <ordinal>-<name> migration scripts
    #[arg(long)]
    pub dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub ordering: Option<OrderingArg>,
}

impl TargetArgs {
    pub fn resolve(&self) -> Result<RunConfig, ExError> {
        let settings = config::load(self.config.as_deref())?;
        config::resolve(
            settings,
            Overrides {
                database: self.database.clone(),
                dir: self.dir.clone(),
                ordering: self.ordering.map(SortOrder::from),
            },
        )
    }
}
