//! Command-line argument definitions for the ingestion tool
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::app::services::csv_parser::parse_timestamp;
use crate::app::store::ResultFilter;
use crate::config::IngestConfig;
use crate::constants::{DEFAULT_LATEST_ROWS_LIMIT, default_workers};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the time-series ingestion tool
///
/// Ingests semicolon-separated time-series CSV files into a result store and
/// queries the stored aggregates and rows.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "timeseries-ingest",
    version,
    about = "Ingest time-series CSV files and query their aggregates",
    long_about = "Parses semicolon-separated time-series CSV files, validates every row, \
                  computes a per-file aggregate and stores aggregate and rows atomically. \
                  Re-ingesting a file name replaces its previous result."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Ingest one or more CSV files
    Ingest(IngestArgs),
    /// List stored aggregates, optionally filtered
    Results(ResultsArgs),
    /// Show the latest stored rows of one file
    Values(ValuesArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Path of the JSON store snapshot
    ///
    /// Defaults to the user data directory, e.g. ~/.local/share/timeseries-ingest/store.json
    #[arg(
        short = 's',
        long = "store",
        value_name = "FILE",
        help = "Path of the JSON store snapshot"
    )]
    pub store_path: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the ingest command
#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    /// Files, directories or glob patterns to ingest
    ///
    /// Directories are searched recursively for `.csv` files. Each file is
    /// stored under its base name.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Number of files ingested concurrently
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        default_value_t = default_workers(),
        help = "Number of files ingested concurrently"
    )]
    pub workers: usize,

    /// Minimum accepted number of data rows per file
    #[arg(long = "min-rows", value_name = "COUNT")]
    pub min_rows: Option<usize>,

    /// Maximum accepted number of data rows per file
    #[arg(long = "max-rows", value_name = "COUNT")]
    pub max_rows: Option<usize>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the results command
#[derive(Debug, Clone, Parser)]
pub struct ResultsArgs {
    /// Only aggregates whose file name contains this text
    #[arg(long = "file-name", value_name = "TEXT")]
    pub file_name_contains: Option<String>,

    /// Earliest accepted minimum timestamp (inclusive)
    #[arg(long = "min-timestamp-from", value_name = "TIME", value_parser = parse_instant)]
    pub min_timestamp_from: Option<DateTime<Utc>>,

    /// Latest accepted minimum timestamp (inclusive)
    #[arg(long = "min-timestamp-to", value_name = "TIME", value_parser = parse_instant)]
    pub min_timestamp_to: Option<DateTime<Utc>>,

    /// Lower bound for the average value (inclusive)
    #[arg(long = "avg-value-from", value_name = "NUMBER")]
    pub avg_value_from: Option<f64>,

    /// Upper bound for the average value (inclusive)
    #[arg(long = "avg-value-to", value_name = "NUMBER")]
    pub avg_value_to: Option<f64>,

    /// Lower bound for the average execution time (inclusive)
    #[arg(long = "avg-execution-time-from", value_name = "NUMBER")]
    pub avg_execution_time_from: Option<f64>,

    /// Upper bound for the average execution time (inclusive)
    #[arg(long = "avg-execution-time-to", value_name = "NUMBER")]
    pub avg_execution_time_to: Option<f64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the values command
#[derive(Debug, Clone, Parser)]
pub struct ValuesArgs {
    /// Stored file name, e.g. metrics.csv
    #[arg(value_name = "FILE_NAME")]
    pub file_name: String,

    /// Maximum number of rows to show
    #[arg(
        short = 'n',
        long = "limit",
        value_name = "COUNT",
        default_value_t = DEFAULT_LATEST_ROWS_LIMIT
    )]
    pub limit: usize,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Output format options for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Parse a timestamp argument with the same formats accepted in uploads
fn parse_instant(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(raw.trim())
        .map(|(instant, _)| instant)
        .ok_or_else(|| format!("unrecognized timestamp '{}'", raw))
}

impl Commands {
    /// Options shared by all commands
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Ingest(args) => &args.common,
            Commands::Results(args) => &args.common,
            Commands::Values(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl IngestArgs {
    /// Validate the ingest arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        if self.workers > 100 {
            return Err(Error::configuration("Number of workers cannot exceed 100"));
        }

        self.ingest_config().validate()
    }

    /// Ingestion configuration with command-line overrides applied
    pub fn ingest_config(&self) -> IngestConfig {
        let defaults = IngestConfig::default();
        let min_rows = self.min_rows.unwrap_or(defaults.min_rows);
        let max_rows = self.max_rows.unwrap_or(defaults.max_rows);
        defaults.with_row_bounds(min_rows, max_rows)
    }
}

impl ResultsArgs {
    /// Validate that every range has its lower bound first
    pub fn validate(&self) -> Result<()> {
        check_range(
            "min timestamp",
            self.min_timestamp_from,
            self.min_timestamp_to,
        )?;
        check_range("average value", self.avg_value_from, self.avg_value_to)?;
        check_range(
            "average execution time",
            self.avg_execution_time_from,
            self.avg_execution_time_to,
        )
    }

    /// Build the store filter from the command-line options
    pub fn to_filter(&self) -> ResultFilter {
        let mut filter = ResultFilter::default()
            .with_min_timestamp_range(self.min_timestamp_from, self.min_timestamp_to)
            .with_avg_value_range(self.avg_value_from, self.avg_value_to)
            .with_avg_execution_time_range(
                self.avg_execution_time_from,
                self.avg_execution_time_to,
            );
        if let Some(fragment) = &self.file_name_contains {
            filter = filter.with_file_name_contains(fragment.clone());
        }
        filter
    }
}

impl ValuesArgs {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::configuration("Limit must be greater than 0"));
        }
        Ok(())
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    from: Option<T>,
    to: Option<T>,
) -> Result<()> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(Error::configuration(format!(
                "Invalid {} range: {} is greater than {}",
                name, from, to
            )));
        }
    }
    Ok(())
}
