//! tsdbd Shared Library
//!
//! This crate contains the types shared between the time-series daemon and
//! its command-line tooling.
//!
//! # Modules
//!
//! - [`models`] - The metric sample and datapoint value types
//! - [`query`] - OpenTSDB-style query compilation, downsampling, and
//!   relative-time parsing
//!
//! # Example
//!
//! ```
//! use shared::models::Metric;
//!
//! let metric: Metric = "sys.cpu 1700000000 0.5 host=web1".parse().unwrap();
//!
//! assert_eq!(metric.name, "sys.cpu");
//! assert_eq!(metric.tags, "host=web1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod query;

/// Re-export common dependencies for convenience.
pub use serde;
pub use serde_json;
pub use validator;
