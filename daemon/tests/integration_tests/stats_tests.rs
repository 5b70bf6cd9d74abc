//! Integration tests for the runtime statistics endpoint.

use axum::http::StatusCode;
use daemon::stats::StatsSampler;
use daemon::worker::Worker;
use std::time::Duration;

use super::common::{get_text, post_text, TestDaemon};

#[tokio::test]
async fn test_stats_renders_three_lines_with_refresh() {
    let daemon = TestDaemon::start();

    let response = tower::ServiceExt::oneshot(
        daemon.router(),
        axum::http::Request::builder()
            .uri("/api/stats")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("refresh").unwrap(), "5");

    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("Puts/second:"));
    assert!(text.contains("Writes/second:"));
    assert!(text.contains("Queue backlog:"));
}

#[tokio::test]
async fn test_stats_reflect_put_traffic_after_sampling() {
    let daemon = TestDaemon::start();

    // A real sampler worker folds the counters about once a second.
    let mut sampler = Worker::spawn(
        "statistics",
        StatsSampler::new(std::sync::Arc::clone(&daemon.stats)),
    )
    .unwrap();

    let status = post_text(
        daemon.router(),
        "/api/put",
        "sys.cpu 1700000000 0.5 host=a\nsys.cpu 1700000001 0.7 host=a\n",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    sampler.stop();

    let (status, text) = get_text(daemon.router(), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!text.contains("Puts/second: 0.00"), "{text}");
}
