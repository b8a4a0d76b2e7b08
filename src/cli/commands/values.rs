//! Values command implementation
//!
//! Shows the most recent stored rows of one file.

use super::shared::{CommandStats, open_store, print_json, setup_logging};
use crate::app::models::StoredRow;
use crate::app::store::ResultStore;
use crate::cli::args::{OutputFormat, ValuesArgs};
use crate::Result;
use colored::Colorize;
use std::time::Instant;
use tracing::debug;

/// Values command runner
///
/// Fails with `Error::NotFound` when nothing is stored under the file name.
pub async fn run_values(args: ValuesArgs) -> Result<CommandStats> {
    let start_time = Instant::now();

    setup_logging(&args.common)?;
    debug!("Command line arguments: {:?}", args);
    args.validate()?;

    let store = open_store(&args.common)?;
    let rows = store.latest_rows(&args.file_name, args.limit).await?;

    match args.common.output_format {
        OutputFormat::Human => print_human(&args.file_name, &rows),
        OutputFormat::Json => print_json(&rows)?,
    }

    Ok(CommandStats {
        records_listed: rows.len(),
        processing_time: start_time.elapsed(),
        ..Default::default()
    })
}

fn print_human(file_name: &str, rows: &[StoredRow]) {
    println!("{} {}", "Latest values for".bold(), file_name.cyan());
    println!(
        "{:<27} {:>14} {:>14}",
        "TIMESTAMP".bold(),
        "EXEC TIME".bold(),
        "VALUE".bold()
    );
    for stored in rows {
        println!(
            "{:<27} {:>14} {:>14}",
            stored.row.timestamp.format("%Y-%m-%dT%H:%M:%S%.fZ"),
            stored.row.execution_time,
            stored.row.value
        );
    }
}
