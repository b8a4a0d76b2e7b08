//! Test utilities for CSV parser testing
//!
//! This module provides common upload fixtures and helpers used across
//! the parser test modules.

use tokio_util::sync::CancellationToken;

use super::{CsvParser, ParseResult};
use crate::Result;
use crate::config::IngestConfig;

mod parser_tests;

/// Header line used by the fixtures
pub const HEADER: &str = "Date;ExecutionTime;Value";

/// Build an upload from a header and data lines joined with `\n`
pub fn upload(lines: &[&str]) -> String {
    let mut content = String::from(HEADER);
    for line in lines {
        content.push('\n');
        content.push_str(line);
    }
    content
}

/// Parse in-memory content with the default configuration
pub fn parse(content: &str) -> Result<ParseResult> {
    CsvParser::new(&IngestConfig::default()).parse_bytes(
        content.as_bytes(),
        "test.csv",
        &CancellationToken::new(),
    )
}
