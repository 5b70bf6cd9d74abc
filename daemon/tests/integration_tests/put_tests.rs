//! Integration tests for HTTP put-line ingestion.
//!
//! Tests cover:
//! - Single and multi-line bodies landing on disk
//! - Rejection of malformed lines
//! - Verb enforcement

use axum::http::StatusCode;
use shared::query::MetricQuery;

use super::common::{post_text, TestDaemon};

#[tokio::test]
async fn test_put_creates_store_file_with_row() {
    let mut daemon = TestDaemon::start();

    let status = post_text(
        daemon.router(),
        "/api/put",
        "sys.cpu 1700000000 0.5 host=a",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    daemon.flush();
    assert!(daemon.data_dir().join("sys.cpu.tsdb").is_file());

    let query = MetricQuery::parse("sum:sys.cpu{host=*}").unwrap();
    let resultset = daemon
        .state
        .datastore()
        .prepare_query(&query)
        .unwrap()
        .unwrap();
    let points = resultset.execute(0, u64::from(u32::MAX)).unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].timestamp, 1_700_000_000);
    assert_eq!(points[0].value, 0.5);
}

#[tokio::test]
async fn test_put_batch_lands_every_line() {
    let mut daemon = TestDaemon::start();

    let body = "sys.cpu 1700000000 0.5 host=a\nsys.mem 1700000000 512 host=a\n";
    let status = post_text(daemon.router(), "/api/put", body).await;
    assert_eq!(status, StatusCode::OK);

    daemon.flush();
    assert!(daemon.data_dir().join("sys.cpu.tsdb").is_file());
    assert!(daemon.data_dir().join("sys.mem.tsdb").is_file());
}

#[tokio::test]
async fn test_put_bad_line_answers_400() {
    let daemon = TestDaemon::start();

    let status = post_text(daemon.router(), "/api/put", "bad line\n").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(daemon.state.datastore().queue_depth(), 0);
}

#[tokio::test]
async fn test_put_get_answers_405() {
    let daemon = TestDaemon::start();

    let (status, _) = super::common::get_json(daemon.router(), "/api/put").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
