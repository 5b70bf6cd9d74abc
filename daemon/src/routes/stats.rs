//! Runtime statistics endpoint.

use crate::state::AppState;
use axum::extract::State;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Creates the statistics routes.
pub fn stats_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(show_stats))
        .with_state(state)
}

/// Renders the last published rates as plain text.
///
/// The `Refresh: 5` header lets a plain browser tab act as a poor man's
/// dashboard.
async fn show_stats(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.stats().snapshot(false).unwrap_or_default();

    let body = format!(
        "Puts/second: {:.2}\r\nWrites/second: {:.2}\r\nQueue backlog: {:.2}\r\n",
        snapshot.puts_per_second, snapshot.writes_per_second, snapshot.queue_backlog
    );

    (
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/text")),
            (
                HeaderName::from_static("refresh"),
                HeaderValue::from_static("5"),
            ),
        ],
        body,
    )
}
