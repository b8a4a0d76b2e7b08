//! CSV parser for time-series uploads
//!
//! This module turns a raw upload into typed rows or fails with a precise,
//! line-numbered diagnostic. The header is line 1 and the first data row is
//! line 2; blank lines are skipped without being reported.
//!
//! ## Architecture
//!
//! - [`parser`] - Upload reading, CSV decoding and line iteration
//! - [`record_parser`] - Field-count check and row construction
//! - [`field_parsers`] - Timestamp and numeric field parsing
//! - [`date_formats`] - Ordered timestamp parsing strategies
//! - [`stats`] - Parse statistics and result structures
//!
//! ## Usage
//!
//! ```rust
//! use timeseries_ingest::app::services::csv_parser::CsvParser;
//! use timeseries_ingest::IngestConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> timeseries_ingest::Result<()> {
//! let parser = CsvParser::new(&IngestConfig::default());
//! let upload: &[u8] = b"Date;ExecutionTime;Value\n2024-01-15T10-30-45.1234Z;1.5;100.25\n";
//! let result = parser
//!     .parse_stream(upload, "metrics.csv", &CancellationToken::new())
//!     .await?;
//!
//! assert_eq!(result.rows.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod date_formats;
pub mod field_parsers;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
mod tests;

pub use date_formats::parse_timestamp;
pub use parser::CsvParser;
pub use stats::{ParseResult, ParseStats};
