//! Ingestion outcome and pipeline state
//!
//! This module provides the report returned for a committed ingestion and
//! the states an ingestion moves through.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::app::models::{Aggregate, AggregateId};

/// Stage reached by one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestState {
    Start,
    /// Any previous aggregate for the file name has been staged for removal
    Replaced,
    Validated,
    Aggregated,
    Committed,
    Failed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Start => "start",
            IngestState::Replaced => "replaced",
            IngestState::Validated => "parsed+validated",
            IngestState::Aggregated => "aggregated",
            IngestState::Committed => "committed",
            IngestState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a committed ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// File name the aggregate is keyed by
    pub file_name: String,
    /// Identity of the new aggregate
    pub aggregate_id: AggregateId,
    /// Number of rows stored with the aggregate
    pub rows_persisted: usize,
    /// Whether an earlier aggregate for the same file name was replaced
    pub replaced_previous: bool,
    /// The stored aggregate
    pub aggregate: Aggregate,
    /// Wall time of the whole pipeline
    #[serde(skip)]
    pub elapsed: Duration,
}

impl IngestReport {
    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "'{}': {} rows, median {:.3}, span {:.1}s{} in {:.2}s",
            self.file_name,
            self.rows_persisted,
            self.aggregate.median_value,
            self.aggregate.span_seconds,
            if self.replaced_previous { " (replaced)" } else { "" },
            self.elapsed.as_secs_f64()
        )
    }
}
