//! Application state module.
//!
//! Defines the shared state handed to the network front-ends.

use crate::datastore::Datastore;
use crate::stats::Statistics;
use std::sync::Arc;

/// State shared by every HTTP handler and telnet connection.
///
/// Holds cloneable handles to the kernel-owned datastore and statistics;
/// handlers only enqueue samples, prepare queries, and bump counters.
#[derive(Debug, Clone)]
pub struct AppState {
    datastore: Arc<Datastore>,
    stats: Arc<Statistics>,
}

impl AppState {
    /// Creates the state from the kernel-owned components.
    #[must_use]
    pub fn new(datastore: Arc<Datastore>, stats: Arc<Statistics>) -> Self {
        Self { datastore, stats }
    }

    /// Returns the datastore handle.
    #[must_use]
    pub fn datastore(&self) -> &Datastore {
        &self.datastore
    }

    /// Returns the statistics handle.
    #[must_use]
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }
}
