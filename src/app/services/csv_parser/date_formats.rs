//! Timestamp parsing strategies
//!
//! Uploaded files use several spellings of the same instant. The strategies
//! below are tried in order and the first one that parses wins; every result
//! is normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A single way of turning a date literal into a UTC instant
pub type DateStrategy = fn(&str) -> Option<DateTime<Utc>>;

/// Ordered (name, parser) table; order matters
pub const TIMESTAMP_STRATEGIES: &[(&str, DateStrategy)] = &[
    ("yyyy-MM-ddTHH-mm-ss.ffffZ", parse_hyphenated_time),
    ("yyyy-MM-ddTHH:mm:ss.ffffZ", parse_colon_time),
    ("ISO-8601", parse_iso8601),
];

/// Human-readable list of the preferred formats, used in diagnostics
pub const EXPECTED_FORMATS: &str = "yyyy-MM-ddTHH-mm-ss.ffffZ or yyyy-MM-ddTHH:mm:ss.ffffZ";

/// Naive layouts accepted by the generic ISO-8601 fallback, interpreted as UTC
const NAIVE_ISO_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp literal, returning the instant and the strategy that matched
pub fn parse_timestamp(literal: &str) -> Option<(DateTime<Utc>, &'static str)> {
    TIMESTAMP_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(literal).map(|instant| (instant, *name)))
}

/// `2024-01-15T10-30-45.1234Z`
fn parse_hyphenated_time(literal: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(literal, "%Y-%m-%dT%H-%M-%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `2024-01-15T10:30:45.1234Z`
fn parse_colon_time(literal: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(literal, "%Y-%m-%dT%H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// RFC 3339 with an explicit offset, then naive date-times and plain dates as UTC
fn parse_iso8601(literal: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(literal) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_ISO_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(literal, layout).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(literal, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
