//! Data models for time-series ingestion
//!
//! This module contains the row and aggregate structures produced by the
//! ingestion pipeline, and their stored counterparts carrying store identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identities
// =============================================================================

/// Store identity of an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(pub u64);

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store identity of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

// =============================================================================
// Rows
// =============================================================================

/// One timestamp/execution-time/value triple read from a CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Start of the measured run, normalized to UTC
    pub timestamp: DateTime<Utc>,

    /// Execution time of the run
    pub execution_time: f64,

    /// Measured value
    pub value: f64,

    /// Name of the file the row came from
    pub source_file: String,
}

impl Row {
    pub fn new(
        timestamp: DateTime<Utc>,
        execution_time: f64,
        value: f64,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            execution_time,
            value,
            source_file: source_file.into(),
        }
    }
}

/// A persisted row, stamped with the aggregate that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: RowId,
    pub aggregate_id: AggregateId,
    #[serde(flatten)]
    pub row: Row,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Summary statistics computed over all rows of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// File name; unique among live aggregates
    pub file_name: String,

    /// Seconds between the earliest and latest timestamp
    pub span_seconds: f64,

    /// Earliest timestamp in the file
    pub min_timestamp: DateTime<Utc>,

    /// Mean execution time
    pub avg_execution_time: f64,

    /// Mean value
    pub avg_value: f64,

    /// Median value
    pub median_value: f64,

    /// Largest value
    pub max_value: f64,

    /// Smallest value
    pub min_value: f64,

    /// When the aggregate was computed
    pub created_at: DateTime<Utc>,
}

/// A persisted aggregate with its store identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAggregate {
    pub id: AggregateId,
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

impl StoredAggregate {
    pub fn file_name(&self) -> &str {
        &self.aggregate.file_name
    }
}
