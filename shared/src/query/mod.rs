//! OpenTSDB-style query language.
//!
//! This module compiles query expressions of the form
//! `AGG:METRIC{FILTERS}[:DOWNSAMPLER]` into parameterized SQL, and provides
//! the post-query [`Downsampler`] plus the `-ago` relative-time parser used
//! by the HTTP query endpoint.
//!
//! # Example
//!
//! ```
//! use shared::query::MetricQuery;
//!
//! let query = MetricQuery::parse("avg:sys.cpu{host=web1|web2}:1m-avg").unwrap();
//! assert_eq!(query.metric, "sys.cpu");
//! assert_eq!(query.downsampler, "1m-avg");
//! ```

mod downsampler;
mod parser;
mod reltime;

pub use downsampler::Downsampler;
pub use parser::{Aggregator, MetricQuery, QueryParseError};
pub use reltime::parse_rel_time;
