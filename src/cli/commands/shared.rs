//! Shared components for CLI commands
//!
//! This module contains common types, utilities, and functions used across
//! multiple CLI command implementations.

use crate::app::store::MemoryStore;
use crate::cli::args::CommonArgs;
use crate::config::default_store_path;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Command statistics for reporting across all commands
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandStats {
    /// Number of input files found
    pub files_discovered: usize,
    /// Number of files committed to the store
    pub files_ingested: usize,
    /// Number of files rejected or failed
    pub files_failed: usize,
    /// Number of rows stored
    pub rows_persisted: usize,
    /// Number of earlier results replaced by re-ingestion
    pub aggregates_replaced: usize,
    /// Number of records printed by a query command
    pub records_listed: usize,
    /// Total command time
    #[serde(skip)]
    pub processing_time: Duration,
}

impl CommandStats {
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

/// Set up structured logging for a command
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("timeseries_ingest={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Resolve the snapshot path from the arguments or the user data directory
pub fn resolve_store_path(args: &CommonArgs) -> Result<PathBuf> {
    match &args.store_path {
        Some(path) => Ok(path.clone()),
        None => default_store_path(),
    }
}

/// Open the snapshot-backed store, creating its directory if needed
pub fn open_store(args: &CommonArgs) -> Result<MemoryStore> {
    let path = resolve_store_path(args)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::io(
                    format!("Failed to create store directory {}", parent.display()),
                    e,
                )
            })?;
            info!("Created store directory {}", parent.display());
        }
    }

    MemoryStore::open(path)
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::serialization("Failed to encode command output", e))?;
    println!("{}", json);
    Ok(())
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use tempfile::TempDir;

    fn common(store_path: Option<PathBuf>) -> CommonArgs {
        CommonArgs {
            store_path,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }

    #[test]
    fn test_command_stats_default() {
        let stats = CommandStats::default();
        assert_eq!(stats.files_ingested, 0);
        assert!(!stats.has_failures());
    }

    #[test]
    fn test_explicit_store_path_wins() {
        let path = PathBuf::from("/tmp/custom.json");
        assert_eq!(resolve_store_path(&common(Some(path.clone()))).unwrap(), path);
    }

    #[test]
    fn test_open_store_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let store = open_store(&common(Some(path.clone()))).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(store.snapshot_path(), Some(path.as_path()));
        assert_eq!(store.aggregate_count().unwrap(), 0);
    }
}
