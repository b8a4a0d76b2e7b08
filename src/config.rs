//! Configuration management and validation.
//!
//! Provides the ingestion configuration (row bounds, accepted time window,
//! upload size limit) and the store location used by the CLI.

use crate::constants::{
    APP_DIR_NAME, DEFAULT_MAX_FILE_BYTES, DEFAULT_STORE_FILE, MAX_ROWS, MIN_ROWS,
    TIMESTAMP_FLOOR_YMD,
};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Configuration for a single ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Minimum accepted number of data rows (inclusive)
    pub min_rows: usize,

    /// Maximum accepted number of data rows (inclusive)
    pub max_rows: usize,

    /// Earliest accepted timestamp
    pub timestamp_floor: DateTime<Utc>,

    /// Largest accepted upload in bytes
    pub max_file_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let (year, month, day) = TIMESTAMP_FLOOR_YMD;
        Self {
            min_rows: MIN_ROWS,
            max_rows: MAX_ROWS,
            timestamp_floor: Utc
                .with_ymd_and_hms(year, month, day, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl IngestConfig {
    /// Set the accepted row count range
    pub fn with_row_bounds(mut self, min_rows: usize, max_rows: usize) -> Self {
        self.min_rows = min_rows;
        self.max_rows = max_rows;
        self
    }

    /// Set the earliest accepted timestamp
    pub fn with_timestamp_floor(mut self, floor: DateTime<Utc>) -> Self {
        self.timestamp_floor = floor;
        self
    }

    /// Set the upload size limit
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_rows == 0 {
            return Err(Error::configuration(
                "min_rows must be at least 1 so an aggregate can always be computed",
            ));
        }

        if self.min_rows > self.max_rows {
            return Err(Error::configuration(format!(
                "min_rows ({}) cannot exceed max_rows ({})",
                self.min_rows, self.max_rows
            )));
        }

        if self.max_file_bytes == 0 {
            return Err(Error::configuration("max_file_bytes must be positive"));
        }

        debug!(
            "Ingest configuration: rows {}..={}, floor {}, max {} bytes",
            self.min_rows, self.max_rows, self.timestamp_floor, self.max_file_bytes
        );
        Ok(())
    }
}

/// Resolve the default snapshot location under the user data directory
pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::configuration("Could not determine user data directory"))?;
    Ok(data_dir.join(APP_DIR_NAME).join(DEFAULT_STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_bounds() {
        let config = IngestConfig::default();

        assert_eq!(config.min_rows, 1);
        assert_eq!(config.max_rows, 10_000);
        assert_eq!(
            config.timestamp_floor,
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let floor = Utc.with_ymd_and_hms(2010, 6, 1, 0, 0, 0).unwrap();
        let config = IngestConfig::default()
            .with_row_bounds(2, 50)
            .with_timestamp_floor(floor)
            .with_max_file_bytes(1024);

        assert_eq!(config.min_rows, 2);
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.timestamp_floor, floor);
        assert_eq!(config.max_file_bytes, 1024);
    }

    #[test]
    fn test_validate_rejects_inconsistent_bounds() {
        assert!(IngestConfig::default().with_row_bounds(0, 10).validate().is_err());
        assert!(IngestConfig::default().with_row_bounds(20, 10).validate().is_err());
        assert!(IngestConfig::default().with_max_file_bytes(0).validate().is_err());
    }
}
