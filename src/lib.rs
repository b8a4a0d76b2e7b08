//! Time-series CSV ingestion library
//!
//! A Rust library that turns semicolon-delimited time-series CSV files
//! (`timestamp;execution_time;value`) into validated rows plus one summary
//! record per file, and stores both as a replaceable unit keyed by file name.
//!
//! This library provides tools for:
//! - Parsing CSV uploads with format-tolerant timestamp handling
//! - Validating rows against domain rules (row count, time window, non-negative values)
//! - Computing per-file aggregates (span, averages, median, min/max)
//! - Replacing a file's previous results atomically on re-ingestion
//! - Querying stored aggregates and the latest rows of a file

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod aggregator;
        pub mod csv_parser;
        pub mod ingestion;
        pub mod validator;
    }
    pub mod store;
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod input;
}

// Re-export commonly used types
pub use app::models::{Aggregate, AggregateId, Row, StoredAggregate, StoredRow};
pub use app::services::ingestion::{IngestReport, IngestionCoordinator};
pub use app::store::{MemoryStore, ResultFilter, ResultStore, StoreTransaction};
pub use config::IngestConfig;

/// Result type alias for the ingestion library
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to callers in place of storage failure details
const STORAGE_CLIENT_MESSAGE: &str = "Internal error while storing ingestion results";

/// Error types for ingestion, validation and storage operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV structure, field or date
    #[error("Line {line}: invalid {field} '{value}': {reason}")]
    Parse {
        line: usize,
        field: String,
        value: String,
        reason: String,
    },

    /// Semantically out-of-range row or file-level row count
    #[error("{}", validation_display(*row, message))]
    Validation {
        row: Option<usize>,
        rule: String,
        value: String,
        message: String,
    },

    /// Persistence or transaction failure
    #[error("Storage error during {operation}")]
    Storage {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal logic error that upstream validation should have prevented
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Ingestion cancelled by the caller
    #[error("Ingestion cancelled before line {line}")]
    Cancelled { line: usize },

    /// Query matched nothing
    #[error("No stored values for file '{file_name}'")]
    NotFound { file_name: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Snapshot (de)serialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

fn validation_display(row: Option<usize>, message: &str) -> String {
    match row {
        Some(row) => format!("Row {}: {}", row, message),
        None => message.to_string(),
    }
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a parse error for a specific line and field
    pub fn parse(
        line: usize,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            line,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a row-level validation error
    pub fn row_validation(
        row: usize,
        rule: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            row: Some(row),
            rule: rule.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a file-level validation error
    pub fn file_validation(
        rule: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            row: None,
            rule: rule.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a storage error, keeping the cause for logs only
    pub fn storage(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(line: usize) -> Self {
        Self::Cancelled { line }
    }

    /// Create a not found error
    pub fn not_found(file_name: impl Into<String>) -> Self {
        Self::NotFound {
            file_name: file_name.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Whether the error was caused by the submitted input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Validation { .. } | Self::NotFound { .. }
        )
    }

    /// Message safe to return to the submitter of a file
    pub fn client_message(&self) -> String {
        match self {
            Self::Storage { .. } | Self::Io { .. } | Self::Serialization { .. } => {
                STORAGE_CLIENT_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON serialization failed".to_string(),
            source: error,
        }
    }
}
