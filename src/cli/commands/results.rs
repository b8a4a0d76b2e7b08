//! Results command implementation
//!
//! Lists stored aggregates matching the command-line filters, newest first.

use super::shared::{CommandStats, open_store, print_json, setup_logging};
use crate::app::models::StoredAggregate;
use crate::app::store::ResultStore;
use crate::cli::args::{OutputFormat, ResultsArgs};
use crate::Result;
use colored::Colorize;
use std::time::Instant;
use tracing::{debug, info};

/// Results command runner
pub async fn run_results(args: ResultsArgs) -> Result<CommandStats> {
    let start_time = Instant::now();

    setup_logging(&args.common)?;
    debug!("Command line arguments: {:?}", args);
    args.validate()?;

    let store = open_store(&args.common)?;
    let filter = args.to_filter();
    let results = store.list_results(&filter).await?;
    info!("{} aggregates match the filter", results.len());

    match args.common.output_format {
        OutputFormat::Human => print_human(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(CommandStats {
        records_listed: results.len(),
        processing_time: start_time.elapsed(),
        ..Default::default()
    })
}

fn print_human(results: &[StoredAggregate]) {
    if results.is_empty() {
        println!("{}", "No stored results match the given filters".yellow());
        return;
    }

    println!(
        "{:>6}  {:<32} {:<27} {:>10} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "ID".bold(),
        "FILE".bold(),
        "FIRST TIMESTAMP".bold(),
        "SPAN (s)".bold(),
        "AVG EXEC".bold(),
        "AVG VALUE".bold(),
        "MEDIAN".bold(),
        "MIN".bold(),
        "MAX".bold()
    );
    for stored in results {
        let aggregate = &stored.aggregate;
        println!(
            "{:>6}  {:<32} {:<27} {:>10.1} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            stored.id,
            aggregate.file_name,
            aggregate.min_timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            aggregate.span_seconds,
            aggregate.avg_execution_time,
            aggregate.avg_value,
            aggregate.median_value,
            aggregate.min_value,
            aggregate.max_value
        );
    }
    println!("\n{} result(s)", results.len());
}
