//! Field parsing utilities for CSV records
//!
//! This module provides helper functions for parsing the timestamp and
//! numeric fields of a data line, producing line-numbered diagnostics.

use super::date_formats::{EXPECTED_FORMATS, parse_timestamp};
use crate::constants::fields;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::trace;

/// Parse the timestamp field of a data line
pub fn parse_timestamp_field(raw: &str, line: usize) -> Result<DateTime<Utc>> {
    let literal = raw.trim();

    match parse_timestamp(literal) {
        Some((instant, strategy)) => {
            trace!("Line {}: timestamp '{}' matched {}", line, literal, strategy);
            Ok(instant)
        }
        None => Err(Error::parse(
            line,
            fields::TIMESTAMP,
            literal,
            format!("unrecognized date format, expected {}", EXPECTED_FORMATS),
        )),
    }
}

/// Parse a culture-invariant floating point field
///
/// Only `.` is accepted as the decimal separator; exponents are allowed.
/// `NaN` and infinities are rejected so downstream comparisons stay meaningful.
pub fn parse_f64_field(raw: &str, line: usize, field_name: &str) -> Result<f64> {
    let literal = raw.trim();

    let value = literal
        .parse::<f64>()
        .map_err(|_| Error::parse(line, field_name, literal, "not a number"))?;

    if !value.is_finite() {
        return Err(Error::parse(
            line,
            field_name,
            literal,
            "not a finite number",
        ));
    }

    Ok(value)
}
