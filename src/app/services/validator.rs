//! Row validation for parsed uploads
//!
//! The validator is a pure gate: it checks the file-level row count and then
//! every row in file order, stopping at the first violation. Row numbers are
//! reported as `index + 2` (header is line 1, numbering is 1-based).

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::models::Row;
use crate::config::IngestConfig;
use crate::constants::{HEADER_LINE, rules};
use crate::{Error, Result};

/// Validates parsed rows against the configured domain rules
#[derive(Debug, Clone)]
pub struct Validator {
    min_rows: usize,
    max_rows: usize,
    timestamp_floor: DateTime<Utc>,
}

impl Validator {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            max_rows: config.max_rows,
            timestamp_floor: config.timestamp_floor,
        }
    }

    /// Validate rows against the current time
    pub fn validate(&self, rows: &[Row]) -> Result<()> {
        self.validate_at(rows, Utc::now())
    }

    /// Validate rows using `now` as the upper bound for every timestamp
    pub fn validate_at(&self, rows: &[Row], now: DateTime<Utc>) -> Result<()> {
        self.check_row_count(rows.len())?;

        for (index, row) in rows.iter().enumerate() {
            self.check_row(row, index + HEADER_LINE + 1, now)?;
        }

        debug!("Validated {} rows", rows.len());
        Ok(())
    }

    fn check_row_count(&self, count: usize) -> Result<()> {
        if count < self.min_rows || count > self.max_rows {
            return Err(Error::file_validation(
                rules::ROW_COUNT,
                count.to_string(),
                format!(
                    "row count must be between {} and {}, got {}",
                    self.min_rows, self.max_rows, count
                ),
            ));
        }
        Ok(())
    }

    fn check_row(&self, row: &Row, row_number: usize, now: DateTime<Utc>) -> Result<()> {
        if row.timestamp > now {
            return Err(Error::row_validation(
                row_number,
                rules::NOT_IN_FUTURE,
                row.timestamp.to_rfc3339(),
                format!("timestamp {} must not be later than now", row.timestamp),
            ));
        }

        if row.timestamp < self.timestamp_floor {
            return Err(Error::row_validation(
                row_number,
                rules::NOT_BEFORE_FLOOR,
                row.timestamp.to_rfc3339(),
                format!(
                    "timestamp {} must not be earlier than {}",
                    row.timestamp,
                    self.timestamp_floor.format("%Y-%m-%d")
                ),
            ));
        }

        if row.execution_time < 0.0 {
            return Err(Error::row_validation(
                row_number,
                rules::EXECUTION_TIME_NON_NEGATIVE,
                row.execution_time.to_string(),
                format!(
                    "execution time {} must not be less than 0",
                    row.execution_time
                ),
            ));
        }

        if row.value < 0.0 {
            return Err(Error::row_validation(
                row_number,
                rules::VALUE_NON_NEGATIVE,
                row.value.to_string(),
                format!("value {} must not be less than 0", row.value),
            ));
        }

        Ok(())
    }
}
