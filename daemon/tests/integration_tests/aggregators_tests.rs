//! Integration tests for aggregator discovery.

use axum::http::StatusCode;

use super::common::{get_json, TestDaemon};

#[tokio::test]
async fn test_aggregators_lists_all_four() {
    let daemon = TestDaemon::start();

    let (status, json) = get_json(daemon.router(), "/api/aggregators").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names, ["avg", "min", "max", "sum"]);
}

#[tokio::test]
async fn test_aggregators_delete_answers_405() {
    let daemon = TestDaemon::start();

    let response = tower::ServiceExt::oneshot(
        daemon.router(),
        axum::http::Request::builder()
            .method("DELETE")
            .uri("/api/aggregators")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
