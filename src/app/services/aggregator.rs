//! Aggregate computation over validated rows
//!
//! Reduces the rows of one file to a single [`Aggregate`]. The input must be
//! non-empty; upstream validation guarantees that, so an empty slice is
//! reported as an invariant violation rather than a user error.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::models::{Aggregate, Row};
use crate::{Error, Result};

/// Compute the aggregate for `file_name` from its rows
pub fn aggregate(rows: &[Row], file_name: &str, created_at: DateTime<Utc>) -> Result<Aggregate> {
    let first = rows.first().ok_or_else(|| {
        Error::invariant_violation(format!(
            "cannot aggregate '{}': no rows to aggregate",
            file_name
        ))
    })?;

    let (min_timestamp, max_timestamp) = rows.iter().fold(
        (first.timestamp, first.timestamp),
        |(min, max), row| (min.min(row.timestamp), max.max(row.timestamp)),
    );
    let span_seconds = (max_timestamp - min_timestamp)
        .to_std()
        .unwrap_or_default()
        .as_secs_f64();

    let mut values: Vec<f64> = rows.iter().map(|row| row.value).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let avg_execution_time = mean(rows.iter().map(|row| row.execution_time), rows.len());
    let avg_value = mean(values.iter().copied(), values.len());
    let median_value = median(&values);
    let min_value = values[0];
    let max_value = values[values.len() - 1];

    debug!(
        "Aggregated {} rows for '{}': span {:.3}s, median {}",
        rows.len(),
        file_name,
        span_seconds,
        median_value
    );

    Ok(Aggregate {
        file_name: file_name.to_string(),
        span_seconds,
        min_timestamp,
        avg_execution_time,
        avg_value,
        median_value,
        max_value,
        min_value,
        created_at,
    })
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    values.sum::<f64>() / count as f64
}

/// Median of an ascending, non-empty slice
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}
