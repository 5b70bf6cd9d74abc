//! Post-query downsampling.
//!
//! Reduces a time-ascending list of datapoints into one aggregate per
//! interval bucket, or a single point for the whole range.

use crate::models::DataPoint;
use crate::query::Aggregator;

/// A stateless downsampling transform built from a spec string.
///
/// The spec has the form `<N><unit>-<method>` where the unit is one of
/// `s` (implicit), `m`, `h`, or `d`, and the method is an [`Aggregator`]
/// name. The literal `all` in place of the interval collapses the whole
/// range into one point. An empty or malformed spec makes
/// [`Downsampler::decimate`] the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downsampler {
    method: Option<Aggregator>,
    interval: u64,
}

impl Downsampler {
    /// Builds a downsampler from its spec string.
    ///
    /// Malformed specs are reported at warn level and produce the identity
    /// transform; an empty spec is the identity without a warning.
    #[must_use]
    pub fn new(spec: &str) -> Self {
        if spec.is_empty() {
            return Self {
                method: None,
                interval: 0,
            };
        }

        let parts: Vec<&str> = spec.split('-').collect();
        if parts.len() != 2 {
            tracing::warn!(spec, "invalid downsampler");
            return Self {
                method: None,
                interval: 0,
            };
        }

        let interval = parse_interval(parts[0]);
        let method = parts[1].parse::<Aggregator>().ok();
        if method.is_none() {
            tracing::warn!(spec, "invalid downsampler method");
        }

        Self { method, interval }
    }

    /// Returns true when decimation would return its input unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.method.is_none()
    }

    /// Reduces a time-ascending list of datapoints.
    ///
    /// A group is anchored at its first timestamp and closes on the first
    /// point at least `interval` seconds later; that point starts the next
    /// group. Each emitted point carries the group-start timestamp and the
    /// method's aggregate of the group. The trailing partial group is always
    /// emitted. With an `all` interval the entire input collapses to one
    /// point at the first timestamp. Empty input yields empty output.
    #[must_use]
    pub fn decimate(&self, input: &[DataPoint]) -> Vec<DataPoint> {
        let Some(method) = self.method else {
            return input.to_vec();
        };
        if input.is_empty() {
            return Vec::new();
        }

        if self.interval == 0 {
            return vec![DataPoint::new(input[0].timestamp, aggregate(method, input))];
        }

        let mut output = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let anchor = input[start].timestamp;
            let mut next = start;
            while next < input.len()
                && input[next].timestamp.saturating_sub(anchor) < self.interval
            {
                next += 1;
            }
            output.push(DataPoint::new(anchor, aggregate(method, &input[start..next])));
            start = next;
        }

        output
    }
}

/// Parses the interval half of a spec (`10`, `5m`, `2h`, `1d`, or `all`).
fn parse_interval(token: &str) -> u64 {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, unit) = token.split_at(digits_end);
    let value: u64 = digits.parse().unwrap_or(0);

    match unit {
        "all" => 0,
        u if u.starts_with('m') => value * 60,
        u if u.starts_with('h') => value * 60 * 60,
        u if u.starts_with('d') => value * 60 * 60 * 24,
        _ => value,
    }
}

/// Applies one aggregation method over a group of points.
fn aggregate(method: Aggregator, points: &[DataPoint]) -> f64 {
    let values = points.iter().map(|p| p.value);
    match method {
        Aggregator::Avg => {
            if points.is_empty() {
                0.0
            } else {
                values.sum::<f64>() / points.len() as f64
            }
        }
        Aggregator::Sum => values.sum(),
        Aggregator::Min => values.reduce(f64::min).unwrap_or(0.0),
        Aggregator::Max => values.reduce(f64::max).unwrap_or(0.0),
    }
}
