//! Application constants for the time-series ingestor
//!
//! This module contains the CSV wire format, validation bounds and
//! default values used throughout the application.

// =============================================================================
// CSV Wire Format
// =============================================================================

/// Field delimiter for uploaded files
pub const FIELD_DELIMITER: u8 = b';';

/// Number of fields in every data line
pub const EXPECTED_FIELD_COUNT: usize = 3;

/// Line number of the header; the first data row is on the next line
pub const HEADER_LINE: usize = 1;

/// Accepted file extension for uploads (compared case-insensitively)
pub const CSV_EXTENSION: &str = "csv";

/// Field names used in diagnostics
pub mod fields {
    pub const TIMESTAMP: &str = "timestamp";
    pub const EXECUTION_TIME: &str = "execution_time";
    pub const VALUE: &str = "value";
    pub const RECORD: &str = "record";
    pub const FILE: &str = "file";
}

// =============================================================================
// Validation Bounds
// =============================================================================

/// Minimum number of data rows per file
pub const MIN_ROWS: usize = 1;

/// Maximum number of data rows per file
pub const MAX_ROWS: usize = 10_000;

/// Floor instant year, month and day (UTC midnight)
pub const TIMESTAMP_FLOOR_YMD: (i32, u32, u32) = (2000, 1, 1);

/// Upper bound on the size of a single upload in bytes
pub const DEFAULT_MAX_FILE_BYTES: usize = 64 * 1024 * 1024;

/// Names of the validation rules reported in diagnostics
pub mod rules {
    pub const ROW_COUNT: &str = "row_count";
    pub const NOT_IN_FUTURE: &str = "timestamp_not_in_future";
    pub const NOT_BEFORE_FLOOR: &str = "timestamp_not_before_floor";
    pub const EXECUTION_TIME_NON_NEGATIVE: &str = "execution_time_non_negative";
    pub const VALUE_NON_NEGATIVE: &str = "value_non_negative";
}

// =============================================================================
// Queries and CLI Defaults
// =============================================================================

/// Number of rows returned by a latest-values query when no limit is given
pub const DEFAULT_LATEST_ROWS_LIMIT: usize = 10;

/// Application directory name under the user data directory
pub const APP_DIR_NAME: &str = "timeseries-ingest";

/// Snapshot file name for the default store location
pub const DEFAULT_STORE_FILE: &str = "store.json";

/// Default number of concurrent ingestions
pub fn default_workers() -> usize {
    num_cpus::get().clamp(1, 8)
}
