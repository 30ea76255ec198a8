//! Command implementations for the ITAG ingester CLI
//!
//! Each command lives in its own module; [`shared`] holds logging,
//! configuration and report printing common to both.

pub mod check;
pub mod ingest;
pub mod shared;

pub use shared::CommandStatus;

use crate::cli::args::{Args, Commands};

/// Main command runner
///
/// Dispatches to the subcommand handler:
/// - `ingest`: validate and bulk load one file
/// - `check`: validate and reconcile without loading
pub async fn run(args: Args) -> anyhow::Result<CommandStatus> {
    match args.command {
        Commands::Ingest(ingest_args) => ingest::run_ingest(ingest_args).await,
        Commands::Check(check_args) => check::run_check(check_args).await,
    }
}
