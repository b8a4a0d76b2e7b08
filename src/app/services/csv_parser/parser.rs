//! Core CSV parser implementation
//!
//! This module reads an upload into memory, decodes it with the `csv` crate
//! and hands each data line to the record parser, stopping at the first
//! malformed line.

use csv::{Position, ReaderBuilder, StringRecord};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::record_parser::{is_blank_record, parse_row};
use super::stats::{ParseResult, ParseStats};
use crate::config::IngestConfig;
use crate::constants::{FIELD_DELIMITER, HEADER_LINE, fields};
use crate::{Error, Result};

/// Parser for semicolon-delimited time-series uploads
///
/// The header line must be present but its content is ignored. Every other
/// non-blank line must hold exactly `timestamp;execution_time;value`.
#[derive(Debug, Clone)]
pub struct CsvParser {
    max_file_bytes: usize,
}

impl CsvParser {
    /// Create a new parser honoring the configured upload size limit
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Read an upload from `reader` and parse it
    pub async fn parse_stream<R>(
        &self,
        reader: R,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseResult>
    where
        R: AsyncRead + Unpin,
    {
        if cancel.is_cancelled() {
            return Err(Error::cancelled(HEADER_LINE));
        }

        let mut content = Vec::new();
        reader
            .take(self.max_file_bytes as u64 + 1)
            .read_to_end(&mut content)
            .await
            .map_err(|e| Error::io(format!("Failed to read upload '{}'", file_name), e))?;

        if content.len() > self.max_file_bytes {
            return Err(Error::parse(
                0,
                fields::FILE,
                file_name,
                format!("upload exceeds the {} byte limit", self.max_file_bytes),
            ));
        }

        self.parse_bytes(&content, file_name, cancel)
    }

    /// Parse an upload that is already in memory
    pub fn parse_bytes(
        &self,
        content: &[u8],
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseResult> {
        info!("Parsing upload '{}' ({} bytes)", file_name, content.len());

        let mut stats = ParseStats {
            bytes_read: content.len(),
            ..ParseStats::new()
        };
        let mut rows = Vec::new();

        let mut reader = ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(content);

        // Header content is not interpreted, so raw bytes are enough
        let header_fields = reader
            .byte_headers()
            .map_err(|e| csv_error(e, content, HEADER_LINE))?
            .len();
        debug!("Header has {} field(s)", header_fields);

        let mut record = StringRecord::new();
        loop {
            if cancel.is_cancelled() {
                return Err(Error::cancelled(reader.position().line() as usize));
            }

            let fallback_line = reader.position().line() as usize;
            let more = reader
                .read_record(&mut record)
                .map_err(|e| csv_error(e, content, fallback_line))?;
            if !more {
                break;
            }

            stats.records_read += 1;
            let line = record
                .position()
                .map(|pos| record_line(content, pos))
                .unwrap_or(fallback_line);

            if is_blank_record(&record) {
                stats.blank_records_skipped += 1;
                continue;
            }

            rows.push(parse_row(&record, line, file_name)?);
            stats.rows_parsed += 1;
        }

        info!(
            "Parsed {} rows from {} records in '{}'",
            stats.rows_parsed, stats.records_read, file_name
        );

        Ok(ParseResult { rows, stats })
    }
}

/// Physical line on which the record at `pos` starts
///
/// The reader stamps a record with its position before skipping empty lines,
/// so any line terminators directly after that offset are counted here.
fn record_line(content: &[u8], pos: &Position) -> usize {
    let start = (pos.byte() as usize).min(content.len());
    let skipped = content[start..]
        .iter()
        .take_while(|byte| matches!(**byte, b'\r' | b'\n'))
        .filter(|byte| **byte == b'\n')
        .count();
    pos.line() as usize + skipped
}

/// Map a CSV decoding failure onto a line-numbered parse error
fn csv_error(error: csv::Error, content: &[u8], fallback_line: usize) -> Error {
    let line = error
        .position()
        .map(|pos| record_line(content, pos))
        .unwrap_or(fallback_line);

    match error.kind() {
        csv::ErrorKind::Utf8 { .. } => Error::parse(
            line,
            fields::RECORD,
            "<non-UTF-8 bytes>",
            "line is not valid UTF-8",
        ),
        _ => Error::parse(line, fields::RECORD, "", error.to_string()),
    }
}
