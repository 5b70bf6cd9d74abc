//! API route definitions.
//!
//! This module organizes all HTTP routes for the daemon: the OpenTSDB-style
//! ingest/query/stats endpoints plus a health check.

mod aggregators;
mod health;
mod put;
mod query;
mod stats;

use crate::state::AppState;
use axum::Router;

/// Assembles every API route onto one router.
///
/// Each endpoint enforces its HTTP verbs through the method router, so a
/// wrong verb answers 405 without touching a handler.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(aggregators::aggregators_routes())
        .merge(put::put_routes(state.clone()))
        .merge(query::query_routes(state.clone()))
        .merge(stats::stats_routes(state))
}
