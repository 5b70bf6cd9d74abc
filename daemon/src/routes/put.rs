//! Put-line ingestion endpoint.
//!
//! Accepts a newline-separated body of put lines, identical to the telnet
//! format minus the `put ` verb prefix.

use crate::state::AppState;
use crate::telnet;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use shared::models::Metric;

/// Creates the put ingestion routes.
pub fn put_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/put", post(ingest_put_lines))
        .with_state(state)
}

/// Ingests every line of the body, stopping at the first invalid one.
///
/// Lines pass through the telnet byte filter first, so control bytes and
/// quoting noise never reach the parser; blank lines are skipped. Samples
/// enqueued before an invalid line stay enqueued and counted.
async fn ingest_put_lines(
    State(state): State<AppState>,
    body: String,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut accepted: u64 = 0;

    for raw in body.split('\n') {
        let line = telnet::clean_line(raw);
        if line.is_empty() {
            continue;
        }

        match line.parse::<Metric>() {
            Ok(metric) => {
                state.datastore().queue_metric(metric);
                accepted += 1;
            }
            Err(error) => {
                tracing::debug!(%error, "rejecting put body");
                state.stats().add_put_count(accepted);
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("put: invalid value: {error}\r\n"),
                ));
            }
        }
    }

    state.stats().add_put_count(accepted);
    Ok(StatusCode::OK)
}
