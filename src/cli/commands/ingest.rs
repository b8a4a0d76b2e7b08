//! Ingest command implementation
//!
//! Discovers input files, ingests them concurrently through one coordinator
//! and reports a per-file summary.

use super::shared::{CommandStats, create_progress_bar, open_store, print_json, setup_logging};
use crate::app::services::ingestion::{IngestReport, IngestionCoordinator};
use crate::app::store::MemoryStore;
use crate::cli::args::{IngestArgs, OutputFormat};
use crate::cli::input::{check_input_file, discover_inputs};
use crate::{Error, Result};
use anyhow::Context;
use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::HumanDuration;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of ingesting one input file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: anyhow::Result<IngestReport>,
}

impl FileOutcome {
    /// Message safe to show for a failed file
    pub fn failure_message(&self) -> Option<String> {
        self.result.as_ref().err().map(|error| {
            match error.downcast_ref::<Error>() {
                Some(ingest_error) => ingest_error.client_message(),
                None => format!("{:#}", error),
            }
        })
    }
}

/// Ingest command runner
///
/// 1. Set up logging and validate arguments
/// 2. Discover input files and open the store
/// 3. Ingest files with up to `--workers` in flight
/// 4. Report the outcome of every file
pub async fn run_ingest(args: IngestArgs, cancel: CancellationToken) -> Result<CommandStats> {
    let start_time = Instant::now();

    setup_logging(&args.common)?;
    info!("Starting ingestion");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let files = discover_inputs(&args.inputs)
        .map_err(|e| Error::configuration(format!("{:#}", e)))?;
    info!("Discovered {} input files", files.len());

    let store = Arc::new(open_store(&args.common)?);
    let coordinator = IngestionCoordinator::new(store, args.ingest_config())?;

    let progress = args
        .common
        .show_progress()
        .then(|| create_progress_bar(files.len() as u64, "Ingesting"));

    let coordinator = &coordinator;
    let cancel_ref = &cancel;
    let mut outcomes: Vec<FileOutcome> = stream::iter(files.iter())
        .map(move |path| async move {
            FileOutcome {
                path: path.clone(),
                result: ingest_file(coordinator, path, cancel_ref).await,
            }
        })
        .buffer_unordered(args.workers)
        .inspect(|outcome| {
            if let Some(pb) = &progress {
                pb.inc(1);
                pb.set_message(outcome.path.display().to_string());
            }
        })
        .collect()
        .await;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    if cancel.is_cancelled() {
        warn!("Ingestion interrupted, uncommitted files were rolled back");
    }

    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    let mut stats = summarize(&outcomes);
    stats.files_discovered = files.len();
    stats.processing_time = start_time.elapsed();

    match args.common.output_format {
        OutputFormat::Human => print_human_report(&outcomes, &stats),
        OutputFormat::Json => print_json_report(&outcomes, &stats)?,
    }

    Ok(stats)
}

/// Check, open and ingest one file
async fn ingest_file(
    coordinator: &IngestionCoordinator<MemoryStore>,
    path: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<IngestReport> {
    let file_name = check_input_file(path)?;
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let report = coordinator
        .ingest(BufReader::new(file), &file_name, cancel)
        .await?;
    Ok(report)
}

fn summarize(outcomes: &[FileOutcome]) -> CommandStats {
    let mut stats = CommandStats::default();
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                stats.files_ingested += 1;
                stats.rows_persisted += report.rows_persisted;
                if report.replaced_previous {
                    stats.aggregates_replaced += 1;
                }
            }
            Err(error) => {
                warn!("Failed to ingest {}: {:#}", outcome.path.display(), error);
                stats.files_failed += 1;
            }
        }
    }
    stats
}

fn print_human_report(outcomes: &[FileOutcome], stats: &CommandStats) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "{} {} -> {} rows, median {}{}",
                "✓".green(),
                outcome.path.display(),
                report.rows_persisted,
                report.aggregate.median_value,
                if report.replaced_previous {
                    " (replaced)".dimmed().to_string()
                } else {
                    String::new()
                }
            ),
            Err(_) => println!(
                "{} {}: {}",
                "✗".red(),
                outcome.path.display(),
                outcome.failure_message().unwrap_or_default()
            ),
        }
    }

    println!();
    println!("{}", "Ingestion Summary".bold());
    println!("   • Files discovered: {}", stats.files_discovered);
    println!(
        "   • Files ingested: {}",
        stats.files_ingested.to_string().green()
    );
    if stats.has_failures() {
        println!("   • Files failed: {}", stats.files_failed.to_string().red());
    }
    println!("   • Rows stored: {}", stats.rows_persisted);
    println!("   • Results replaced: {}", stats.aggregates_replaced);
    println!("   • Time: {}", HumanDuration(stats.processing_time));
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    path: &'a Path,
    error: String,
    client_error: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a CommandStats,
    processing_time_seconds: f64,
    ingested: Vec<&'a IngestReport>,
    failed: Vec<JsonFailure<'a>>,
}

fn print_json_report(outcomes: &[FileOutcome], stats: &CommandStats) -> Result<()> {
    let report = JsonReport {
        summary: stats,
        processing_time_seconds: stats.processing_time.as_secs_f64(),
        ingested: outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .collect(),
        failed: outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| JsonFailure {
                path: &outcome.path,
                error: outcome.failure_message().unwrap_or_default(),
                client_error: outcome
                    .result
                    .as_ref()
                    .err()
                    .and_then(|e| e.downcast_ref::<Error>())
                    .is_none_or(Error::is_client_error),
            })
            .collect(),
    };
    print_json(&report)
}
