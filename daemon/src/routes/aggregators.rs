//! Aggregator discovery endpoint.

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use shared::query::Aggregator;

/// Creates the aggregator discovery routes.
pub fn aggregators_routes() -> Router {
    Router::new().route(
        "/api/aggregators",
        get(list_aggregators).post(list_aggregators),
    )
}

/// Lists the aggregation functions the query language accepts.
async fn list_aggregators() -> impl IntoResponse {
    let body = serde_json::to_string(&Aggregator::NAMES).unwrap_or_default();
    ([(header::CONTENT_TYPE, "text/text")], body)
}
