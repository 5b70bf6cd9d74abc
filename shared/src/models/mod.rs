//! Data models for the time-series daemon.
//!
//! This module contains the core value types: the ingested [`Metric`] sample
//! and the [`DataPoint`] pairs produced by queries.

pub mod datapoint;
pub mod metric;

pub use datapoint::DataPoint;
pub use metric::{Metric, MetricParseError};
