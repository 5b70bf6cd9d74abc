//! Query result datapoint.

use serde::{Deserialize, Serialize};

/// A `(timestamp, value)` pair as returned by a query or a downsampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// The (possibly aggregated) sample value.
    pub value: f64,
}

impl DataPoint {
    /// Creates a new datapoint.
    #[must_use]
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}
