//! Parsing statistics and result structures
//!
//! This module provides the parse result handed to the validator together
//! with counters used for logging and reporting.

use crate::app::models::Row;

/// Parsing result with rows in file order and basic statistics
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows, in the order they appear in the file
    pub rows: Vec<Row>,

    /// Basic parsing statistics
    pub stats: ParseStats,
}

/// Simple parsing statistics
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseStats {
    /// Size of the upload in bytes
    pub bytes_read: usize,

    /// Data records produced by the CSV reader (header excluded)
    pub records_read: usize,

    /// Whitespace-only records skipped; empty lines never reach the reader
    pub blank_records_skipped: usize,

    /// Rows successfully parsed
    pub rows_parsed: usize,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }
}
