//! Integration tests for windowed queries.
//!
//! Tests cover:
//! - Ingest-then-query round trips with and without downsampling
//! - Tag alternation filters
//! - Window bounds relative to now
//! - Error handling for malformed expressions

use axum::http::StatusCode;

use super::common::{get_json, post_text, TestDaemon};

fn recent() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64 - 60
}

#[tokio::test]
async fn test_put_then_query_returns_both_points() {
    let mut daemon = TestDaemon::start();
    let ts = recent();

    let body = format!("sys.cpu {ts} 0.5 host=a\nsys.cpu {} 0.7 host=a\n", ts + 1);
    let status = post_text(daemon.router(), "/api/put", &body).await;
    assert_eq!(status, StatusCode::OK);
    daemon.flush();

    let (status, json) = get_json(
        daemon.router(),
        "/api/query?start=1h-ago&end=0s-ago&m=avg:sys.cpu%7Bhost=*%7D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["metric"], "sys.cpu");

    let dps = results[0]["dps"].as_object().unwrap();
    assert_eq!(dps.len(), 2);
    assert_eq!(dps[&ts.to_string()], 0.5);
    assert_eq!(dps[&(ts + 1).to_string()], 0.7);
}

#[tokio::test]
async fn test_query_with_all_avg_downsampler() {
    let mut daemon = TestDaemon::start();
    let ts = recent();

    let body = format!("sys.cpu {ts} 0.5 host=a\nsys.cpu {} 0.7 host=a\n", ts + 1);
    post_text(daemon.router(), "/api/put", &body).await;
    daemon.flush();

    let (status, json) = get_json(
        daemon.router(),
        "/api/query?start=1h-ago&m=avg:sys.cpu%7Bhost=*%7D:all-avg",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let dps = json[0]["dps"].as_object().unwrap();
    assert_eq!(dps.len(), 1);

    let value = dps[&ts.to_string()].as_f64().unwrap();
    assert!((value - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_query_alternation_sums_matching_tags_only() {
    let mut daemon = TestDaemon::start();
    let ts = recent();

    let body = format!(
        "x {ts} 1 k=a\nx {} 2 k=b\nx {} 4 k=c\n",
        ts + 1,
        ts + 2
    );
    post_text(daemon.router(), "/api/put", &body).await;
    daemon.flush();

    let (status, json) = get_json(
        daemon.router(),
        "/api/query?start=1h-ago&m=sum:x%7Bk=a%7Cb%7D:all-sum",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["dps"][ts.to_string()], 3.0);
}

#[tokio::test]
async fn test_query_window_excludes_old_samples() {
    let mut daemon = TestDaemon::start();
    let ts = recent();

    // One sample inside the hour window, one far in the past.
    let body = format!("sys.cpu {ts} 0.5 host=a\nsys.cpu 1000000 0.9 host=a\n");
    post_text(daemon.router(), "/api/put", &body).await;
    daemon.flush();

    let (status, json) = get_json(
        daemon.router(),
        "/api/query?start=1h-ago&m=sum:sys.cpu%7Bhost=*%7D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let dps = json[0]["dps"].as_object().unwrap();
    assert_eq!(dps.len(), 1);
    assert!(dps.contains_key(&ts.to_string()));
}

#[tokio::test]
async fn test_query_unknown_metric_yields_empty_array() {
    let daemon = TestDaemon::start();

    let (status, json) = get_json(
        daemon.router(),
        "/api/query?start=1h-ago&m=avg:missing%7Bhost=*%7D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_query_malformed_expression_answers_400() {
    let daemon = TestDaemon::start();

    let (status, _) = get_json(daemon.router(), "/api/query?m=avg").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
