//! Aggregate query filters
//!
//! All bounds are optional and inclusive; an empty filter matches everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::models::Aggregate;

/// Predicate over stored aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFilter {
    /// Substring of the file name
    pub file_name_contains: Option<String>,
    pub min_timestamp_from: Option<DateTime<Utc>>,
    pub min_timestamp_to: Option<DateTime<Utc>>,
    pub avg_value_from: Option<f64>,
    pub avg_value_to: Option<f64>,
    pub avg_execution_time_from: Option<f64>,
    pub avg_execution_time_to: Option<f64>,
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.file_name_contains = Some(fragment.into());
        self
    }

    pub fn with_min_timestamp_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.min_timestamp_from = from;
        self.min_timestamp_to = to;
        self
    }

    pub fn with_avg_value_range(mut self, from: Option<f64>, to: Option<f64>) -> Self {
        self.avg_value_from = from;
        self.avg_value_to = to;
        self
    }

    pub fn with_avg_execution_time_range(mut self, from: Option<f64>, to: Option<f64>) -> Self {
        self.avg_execution_time_from = from;
        self.avg_execution_time_to = to;
        self
    }

    /// Whether `aggregate` satisfies every bound that is set
    pub fn matches(&self, aggregate: &Aggregate) -> bool {
        let name_matches = self
            .file_name_contains
            .as_deref()
            .filter(|fragment| !fragment.trim().is_empty())
            .is_none_or(|fragment| aggregate.file_name.contains(fragment));

        name_matches
            && in_range(
                aggregate.min_timestamp,
                self.min_timestamp_from,
                self.min_timestamp_to,
            )
            && in_range(aggregate.avg_value, self.avg_value_from, self.avg_value_to)
            && in_range(
                aggregate.avg_execution_time,
                self.avg_execution_time_from,
                self.avg_execution_time_to,
            )
    }
}

fn in_range<T: PartialOrd>(value: T, from: Option<T>, to: Option<T>) -> bool {
    from.is_none_or(|from| value >= from) && to.is_none_or(|to| value <= to)
}
