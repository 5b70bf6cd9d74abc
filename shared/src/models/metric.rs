//! Metric sample model.
//!
//! Defines the `Metric` value type and the parser for OpenTSDB-style put
//! lines (`<name> <timestamp> <value> <tags>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Errors that can occur while parsing or constructing a metric.
#[derive(Debug, Error)]
pub enum MetricParseError {
    /// The line is missing one of name, timestamp, value, or tags.
    #[error("missing field: expected '<name> <timestamp> <value> <tags>'")]
    MissingField,

    /// The timestamp token is not a plain unsigned integer.
    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// The value token is not a number.
    #[error("invalid value: '{0}'")]
    InvalidValue(String),

    /// Validation failed with details.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// A single metric sample.
///
/// A sample carries the series name, a timestamp in whole seconds since the
/// Unix epoch, a numeric value, and a free-form tag string of space-separated
/// `k=v` pairs. Tags are stored verbatim; queries match them by substring.
///
/// # Example
///
/// ```
/// use shared::models::Metric;
///
/// let metric: Metric = "sys.cpu.user 1700000000 0.5 host=web1 dc=eu".parse().unwrap();
///
/// assert_eq!(metric.name, "sys.cpu.user");
/// assert_eq!(metric.timestamp, 1_700_000_000);
/// assert_eq!(metric.tags, "host=web1 dc=eu");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Metric {
    /// The series name (e.g. "`sys.cpu.user`").
    #[validate(length(min = 1, message = "Metric name cannot be empty"))]
    pub name: String,

    /// Seconds since the Unix epoch.
    pub timestamp: u64,

    /// The sample value.
    pub value: f64,

    /// Space-separated `k=v` tag pairs; never empty.
    #[validate(length(min = 1, message = "Metric tags cannot be empty"))]
    pub tags: String,
}

impl Metric {
    /// Creates a metric from already-parsed fields.
    ///
    /// # Errors
    ///
    /// Returns [`MetricParseError::MissingField`] if the name or tags are
    /// empty.
    pub fn new(
        name: impl Into<String>,
        timestamp: u64,
        value: f64,
        tags: impl Into<String>,
    ) -> Result<Self, MetricParseError> {
        let metric = Self {
            name: name.into(),
            timestamp,
            value,
            tags: tags.into(),
        };

        if metric.name.is_empty() || metric.tags.is_empty() {
            return Err(MetricParseError::MissingField);
        }
        metric.validate()?;

        Ok(metric)
    }
}

impl FromStr for Metric {
    type Err = MetricParseError;

    /// Parses a put line of the form `<name> <timestamp> <value> <tags>`.
    ///
    /// The line is split on its first three spaces; everything after the
    /// third space is the tag string, so tag values may contain spaces.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = line.split_once(' ').ok_or(MetricParseError::MissingField)?;
        let (timestamp, rest) = rest.split_once(' ').ok_or(MetricParseError::MissingField)?;
        let (value, tags) = rest.split_once(' ').ok_or(MetricParseError::MissingField)?;

        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| MetricParseError::InvalidTimestamp(timestamp.to_string()))?;
        let value: f64 = value
            .parse()
            .map_err(|_| MetricParseError::InvalidValue(value.to_string()))?;

        Self::new(name, timestamp, value, tags)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.timestamp, self.value, self.tags
        )
    }
}
