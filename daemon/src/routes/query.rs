//! Windowed query endpoint.
//!
//! Parses the raw query string into `start`/`end` relative times and one or
//! more `m=` metric queries, executes each against its per-metric store, and
//! downsamples the results.

use crate::state::AppState;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use shared::query::{parse_rel_time, Downsampler, MetricQuery};

/// Creates the query routes.
pub fn query_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/query", get(run_query))
        .with_state(state)
}

/// Executes every `m=` subquery over the requested window.
///
/// The window is computed against the current time: `start` and `end` are
/// relative tokens (`1h-ago`), with `end` defaulting to now. Subqueries for
/// metrics without a store are omitted from the response, matching the
/// OpenTSDB behavior of empty result sets.
async fn run_query(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, (StatusCode, String)> {
    let raw = raw.unwrap_or_default();
    let now = chrono::Utc::now().timestamp().max(0) as u64;

    let mut start_time = 0u64;
    let mut end_time = now;
    let mut queries: Vec<MetricQuery> = Vec::new();

    for part in raw.split('&').filter(|part| !part.is_empty()) {
        if let Some(value) = part.strip_prefix("start=") {
            start_time = now.saturating_sub(parse_rel_time(&decode(value)));
        } else if let Some(value) = part.strip_prefix("end=") {
            end_time = now.saturating_sub(parse_rel_time(&decode(value)));
        } else if let Some(value) = part.strip_prefix("m=") {
            let query = MetricQuery::parse(&decode(value)).map_err(|error| {
                tracing::debug!(%error, "rejecting query string");
                (StatusCode::BAD_REQUEST, format!("{error}\r\n"))
            })?;
            queries.push(query);
        }
    }

    let response = tokio::task::spawn_blocking(move || -> anyhow::Result<Value> {
        let mut subqueries = Vec::new();
        for query in &queries {
            let Some(resultset) = state.datastore().prepare_query(query)? else {
                continue;
            };

            let results = resultset.execute(start_time, end_time)?;
            let output = Downsampler::new(resultset.downsampler()).decimate(&results);

            let mut dps = Map::new();
            for point in output {
                dps.insert(point.timestamp.to_string(), json!(point.value));
            }
            subqueries.push(json!({
                "metric": resultset.metric(),
                "dps": Value::Object(dps),
            }));
        }
        Ok(Value::Array(subqueries))
    })
    .await
    .map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "query worker failed\r\n".to_string(),
        )
    })?
    .map_err(|error| {
        tracing::error!(%error, "query execution failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{error}\r\n"))
    })?;

    Ok(Json(response))
}

/// Percent-decodes one query-string value, passing it through on failure.
fn decode(value: &str) -> String {
    urlencoding::decode(value).map_or_else(|_| value.to_string(), |s| s.into_owned())
}
