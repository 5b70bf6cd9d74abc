//! Metric query compiler.
//!
//! Translates query expressions like `avg:sys.cpu{host=web1|web2}:1m-avg`
//! into a parameterized SELECT against a per-metric store, the target metric
//! name, and an opaque downsampler specification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during query parsing.
#[derive(Debug, Error)]
pub enum QueryParseError {
    /// The expression does not have the `AGG:METRIC{FILTERS}` shape.
    #[error("malformed query: expected 'AGG:METRIC{{FILTERS}}[:DOWNSAMPLER]', got '{0}'")]
    Malformed(String),

    /// The aggregator segment is not one of avg, sum, min, max.
    #[error("unknown aggregator: '{0}'")]
    UnknownAggregator(String),

    /// The filter braces are present but empty.
    #[error("at least one tag filter is required: '{0}'")]
    MissingFilter(String),

    /// A filter is not a single `key=value` pair.
    #[error("invalid key/value filter: '{0}'")]
    InvalidFilter(String),
}

/// An aggregation function applied inside `GROUP BY timestamp` and by the
/// downsampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    /// Arithmetic mean of the group.
    Avg,
    /// Sum of the group.
    Sum,
    /// Minimum of the group.
    Min,
    /// Maximum of the group.
    Max,
}

impl Aggregator {
    /// The aggregator names advertised by the HTTP discovery endpoint.
    pub const NAMES: [&'static str; 4] = ["avg", "min", "max", "sum"];
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avg => write!(f, "avg"),
            Self::Sum => write!(f, "sum"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

impl FromStr for Aggregator {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(Self::Avg),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(QueryParseError::UnknownAggregator(other.to_string())),
        }
    }
}

/// A compiled metric query.
///
/// The SQL selects `timestamp` and the aggregated `value` over a time window
/// bound later as `?1` (start) and `?2` (end); tag filters are folded into
/// `LIKE` clauses. The downsampler segment is carried through opaquely for
/// post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    /// The metric name the query targets.
    pub metric: String,
    /// The aggregation function applied per timestamp group.
    pub aggregator: Aggregator,
    /// The generated SELECT statement with `?1`/`?2` window placeholders.
    pub sql: String,
    /// The opaque downsampler spec (empty when none was given).
    pub downsampler: String,
}

impl MetricQuery {
    /// Parses a query expression of the form
    /// `AGG:METRIC{FILTERS}[:DOWNSAMPLER]`.
    ///
    /// Filters are comma-separated `key=value` pairs; a value may alternate
    /// with `|` and may use `*` as a wildcard. Tag matching is by substring,
    /// so `host=web` also matches `host=web1`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryParseError`] when the expression has fewer than two
    /// colon segments, the braces are missing or empty, the aggregator is
    /// unknown, or a filter is not exactly one `key=value` pair.
    pub fn parse(input: &str) -> Result<Self, QueryParseError> {
        let segments: Vec<&str> = input.split(':').collect();
        if segments.len() < 2 {
            return Err(QueryParseError::Malformed(input.to_string()));
        }

        let aggregator: Aggregator = segments[0].parse()?;

        let target = segments[1];
        let open = target
            .find('{')
            .ok_or_else(|| QueryParseError::Malformed(input.to_string()))?;
        let close = target[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| QueryParseError::Malformed(input.to_string()))?;

        let metric = &target[..open];
        if metric.is_empty() {
            return Err(QueryParseError::Malformed(input.to_string()));
        }

        let filters = &target[open + 1..close];
        if filters.is_empty() {
            return Err(QueryParseError::MissingFilter(input.to_string()));
        }

        let mut sql = format!(
            "SELECT timestamp, {aggregator}(value) as value FROM METRIC \
             WHERE (timestamp >= ?1 AND timestamp <= ?2)"
        );
        for filter in filters.split(',') {
            sql.push_str(" AND ");
            sql.push_str(&tag_clause(filter)?);
        }
        sql.push_str(" GROUP BY timestamp");

        Ok(Self {
            metric: metric.to_string(),
            aggregator,
            sql,
            downsampler: segments.get(2).unwrap_or(&"").to_string(),
        })
    }
}

/// Builds the `tags LIKE` clause for one `key=value` filter.
///
/// The `*` wildcard maps to SQL `%`; `a|b` alternation becomes a
/// parenthesized `OR` group. The filter value is embedded into the pattern
/// literal, so quotes are rejected outright.
fn tag_clause(filter: &str) -> Result<String, QueryParseError> {
    if filter.contains('\'') {
        return Err(QueryParseError::InvalidFilter(filter.to_string()));
    }

    // the wildcard becomes the SQL one before the pattern is assembled
    let filter = filter.replace('*', "%");

    let parts: Vec<&str> = filter.split('=').collect();
    if parts.len() != 2 {
        return Err(QueryParseError::InvalidFilter(filter.clone()));
    }
    let (key, value) = (parts[0], parts[1]);

    let alternatives: Vec<String> = value
        .split('|')
        .map(|v| format!("tags LIKE '%{key}={v}%'"))
        .collect();

    if alternatives.len() > 1 {
        Ok(format!("({})", alternatives.join(" OR ")))
    } else {
        Ok(alternatives.into_iter().next().unwrap_or_default())
    }
}
