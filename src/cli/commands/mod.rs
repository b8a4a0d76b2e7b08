//! Command implementations for the ingestion CLI
//!
//! Each command is implemented in its own module:
//! - `ingest`: concurrent ingestion of CSV files into the store
//! - `results`: filtered listing of stored aggregates
//! - `values`: latest stored rows of one file

pub mod ingest;
pub mod results;
pub mod shared;
pub mod values;

pub use shared::CommandStats;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler. `cancel` is triggered when the user
/// interrupts the program; in-flight ingestions roll back.
pub async fn run(args: Args, cancel: CancellationToken) -> Result<CommandStats> {
    let command = args
        .command
        .ok_or_else(|| Error::configuration("No command given"))?;

    match command {
        Commands::Ingest(ingest_args) => ingest::run_ingest(ingest_args, cancel).await,
        Commands::Results(results_args) => results::run_results(results_args).await,
        Commands::Values(values_args) => values::run_values(values_args).await,
    }
}
