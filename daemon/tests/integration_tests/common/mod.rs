//! Common test utilities and helpers for integration tests.
//!
//! Provides a daemon harness on a throwaway data directory, with the writer
//! worker driven inline so tests stay deterministic, plus small HTTP
//! request helpers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use daemon::datastore::{Datastore, DatastoreWriter};
use daemon::stats::Statistics;
use daemon::worker::WorkerProc;
use daemon::{create_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

/// A daemon wired onto a throwaway data directory.
///
/// The writer worker is held inline instead of on its own thread: tests
/// call [`TestDaemon::flush`] to drain the queue to disk exactly when they
/// need to.
pub struct TestDaemon {
    /// The shared handles the network front-ends would hold.
    pub state: AppState,
    /// The statistics sink, as the kernel would own it.
    pub stats: Arc<Statistics>,
    writer: DatastoreWriter,
    dir: TempDir,
}

impl TestDaemon {
    /// Starts a daemon over a fresh data directory.
    pub fn start() -> Self {
        Self::start_in(tempfile::tempdir().unwrap())
    }

    /// Starts a daemon over an existing data directory, running the
    /// writer's startup scan.
    pub fn start_in(dir: TempDir) -> Self {
        let stats = Arc::new(Statistics::new());
        let (datastore, mut writer) = Datastore::new(
            dir.path().to_path_buf(),
            "tsdb".to_string(),
            "testhost".to_string(),
            Arc::clone(&stats),
        );
        writer.start().unwrap();

        Self {
            state: AppState::new(datastore, Arc::clone(&stats)),
            stats,
            writer,
            dir,
        }
    }

    /// The daemon's full router.
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// The data directory path.
    pub fn data_dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Drives one writer tick, draining everything queued to disk.
    pub fn flush(&mut self) {
        self.writer.process();
    }

    /// Stops the writer (which drains the queue) and hands the data
    /// directory back for a restart.
    pub fn stop(mut self) -> TempDir {
        self.writer.stop();
        self.dir
    }
}

/// Helper to make a GET request and parse the JSON response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to make a GET request and return the body as text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Helper to POST a plain-text body.
pub async fn post_text(app: Router, uri: &str, body: &str) -> StatusCode {
    tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}
