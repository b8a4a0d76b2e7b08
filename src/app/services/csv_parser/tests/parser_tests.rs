//! Tests for the main CSV parser functionality

use super::*;
use crate::Error;
use chrono::{TimeZone, Utc};

#[test]
fn test_parse_valid_upload_preserves_line_order() {
    let content = upload(&[
        "2024-01-15T10-30-45.1234Z;1.5;100.25",
        "2024-01-15T10-31-00.5678Z;2.3;150.75",
        "2024-01-15T09:00:00.0000Z;0.7;3",
    ]);

    let result = parse(&content).unwrap();

    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.stats.rows_parsed, 3);
    assert_eq!(result.rows[0].execution_time, 1.5);
    assert_eq!(result.rows[1].value, 150.75);
    assert_eq!(
        result.rows[2].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    );
    assert!(result.rows.iter().all(|row| row.source_file == "test.csv"));
}

#[test]
fn test_header_content_is_ignored() {
    let content = "anything at all\n2024-01-15T10-30-45Z;1;2";
    let result = parse(content).unwrap();

    assert_eq!(result.rows.len(), 1);
}

#[test]
fn test_empty_upload_yields_no_rows() {
    let result = parse("").unwrap();
    assert!(result.rows.is_empty());

    let header_only = parse(HEADER).unwrap();
    assert!(header_only.rows.is_empty());
}

#[test]
fn test_blank_lines_are_skipped() {
    let content = upload(&[
        "2024-01-15T10-30-45Z;1;2",
        "",
        "   ",
        "2024-01-15T10-31-45Z;3;4",
        "",
    ]);

    let result = parse(&content).unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.stats.blank_records_skipped, 1);
}

#[test]
fn test_crlf_line_endings() {
    let content = "Date;ExecutionTime;Value\r\n2024-01-15T10-30-45Z;1;2\r\n2024-01-15T10-31-45Z;3;4\r\n";
    let result = parse(content).unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[1].value, 4.0);
}

#[test]
fn test_fields_are_trimmed() {
    let content = upload(&[" 2024-01-15T10-30-45Z ; 1.5 ;\t2e2 "]);
    let result = parse(&content).unwrap();

    assert_eq!(result.rows[0].execution_time, 1.5);
    assert_eq!(result.rows[0].value, 200.0);
}

#[test]
fn test_field_count_mismatch_reports_line_and_counts() {
    let content = upload(&[
        "2024-01-15T10-30-45Z;1;2",
        "2024-01-15T10-31-45Z;3",
    ]);

    match parse(&content) {
        Err(Error::Parse {
            line,
            field,
            reason,
            ..
        }) => {
            assert_eq!(line, 3);
            assert_eq!(field, "record");
            assert!(reason.contains("expected 3 fields, found 2"), "{}", reason);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_too_many_fields() {
    let content = upload(&["2024-01-15T10-30-45Z;1;2;3"]);
    let err = parse(&content).unwrap_err();

    assert!(err.to_string().contains("Line 2"));
    assert!(err.to_string().contains("found 4"));
}

#[test]
fn test_line_numbers_count_skipped_blank_lines() {
    let content = upload(&["2024-01-15T10-30-45Z;1;2", "", "", "bad-date;1;2"]);

    match parse(&content) {
        Err(Error::Parse { line, value, .. }) => {
            assert_eq!(line, 5);
            assert_eq!(value, "bad-date");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_invalid_date_reports_literal() {
    let content = upload(&["invalid-date;1.5;100.25"]);
    let err = parse(&content).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("Line 2"));
    assert!(message.contains("'invalid-date'"));
    assert!(message.contains("yyyy-MM-ddTHH-mm-ss.ffffZ"));
}

#[test]
fn test_invalid_numbers_report_field_name() {
    let bad_execution = upload(&["2024-01-15T10-30-45Z;fast;1"]);
    match parse(&bad_execution) {
        Err(Error::Parse { field, value, .. }) => {
            assert_eq!(field, "execution_time");
            assert_eq!(value, "fast");
        }
        other => panic!("expected parse error, got {:?}", other),
    }

    let comma_decimal = upload(&["2024-01-15T10-30-45Z;1;1,5"]);
    match parse(&comma_decimal) {
        Err(Error::Parse { field, value, .. }) => {
            assert_eq!(field, "value");
            assert_eq!(value, "1,5");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    for literal in ["NaN", "inf", "-infinity"] {
        let content = upload(&[&format!("2024-01-15T10-30-45Z;1;{}", literal)]);
        assert!(parse(&content).is_err(), "{} should be rejected", literal);
    }
}

#[test]
fn test_negative_numbers_parse() {
    // Range checks belong to the validator
    let content = upload(&["2024-01-15T10-30-45Z;-1.5;-100"]);
    let result = parse(&content).unwrap();

    assert_eq!(result.rows[0].execution_time, -1.5);
    assert_eq!(result.rows[0].value, -100.0);
}

#[test]
fn test_invalid_utf8_is_a_parse_error() {
    let mut content = upload(&["2024-01-15T10-30-45Z;1;2"]).into_bytes();
    content.extend_from_slice(b"\n2024-01-15T10-30-45Z;1;\xff\xfe");

    let err = CsvParser::new(&IngestConfig::default())
        .parse_bytes(&content, "test.csv", &CancellationToken::new())
        .unwrap_err();

    match err {
        Error::Parse { line, .. } => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_cancelled_token_aborts_parsing() {
    let token = CancellationToken::new();
    token.cancel();

    let content = upload(&["2024-01-15T10-30-45Z;1;2"]);
    let err = CsvParser::new(&IngestConfig::default())
        .parse_bytes(content.as_bytes(), "test.csv", &token)
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
}

#[tokio::test]
async fn test_parse_stream_enforces_size_limit() {
    let parser = CsvParser::new(&IngestConfig::default().with_max_file_bytes(16));
    let content = upload(&["2024-01-15T10-30-45Z;1;2"]);

    let err = parser
        .parse_stream(content.as_bytes(), "big.csv", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Parse { line: 0, .. }));
    assert!(err.to_string().contains("16 byte limit"));
}

#[tokio::test]
async fn test_parse_stream_reads_async_source() {
    let parser = CsvParser::new(&IngestConfig::default());
    let content = upload(&["2024-01-15T10-30-45Z;1;2", "2024-01-15T10-30-46Z;1;3"]);

    let result = parser
        .parse_stream(content.as_bytes(), "test.csv", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.stats.bytes_read, content.len());
}
