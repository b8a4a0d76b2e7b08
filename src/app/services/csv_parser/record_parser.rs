//! Individual CSV record parsing
//!
//! This module turns one decoded data line into a [`Row`], enforcing the
//! three-field layout before any field is interpreted.

use csv::StringRecord;

use super::field_parsers::{parse_f64_field, parse_timestamp_field};
use crate::app::models::Row;
use crate::constants::{EXPECTED_FIELD_COUNT, fields};
use crate::{Error, Result};

/// Parse a single data record found on `line`
pub fn parse_row(record: &StringRecord, line: usize, file_name: &str) -> Result<Row> {
    if record.len() != EXPECTED_FIELD_COUNT {
        let raw_line = record.iter().collect::<Vec<_>>().join(";");
        return Err(Error::parse(
            line,
            fields::RECORD,
            raw_line,
            format!(
                "expected {} fields, found {}",
                EXPECTED_FIELD_COUNT,
                record.len()
            ),
        ));
    }

    let timestamp = parse_timestamp_field(&record[0], line)?;
    let execution_time = parse_f64_field(&record[1], line, fields::EXECUTION_TIME)?;
    let value = parse_f64_field(&record[2], line, fields::VALUE)?;

    Ok(Row::new(timestamp, execution_time, value, file_name))
}

/// Whether a record came from a blank or whitespace-only line
pub fn is_blank_record(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty()) && record.len() <= 1
}
