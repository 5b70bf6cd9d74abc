//! tsdbd - a lightweight time-series database daemon.
//!
//! Producers push numeric samples over a telnet-style line protocol or the
//! HTTP API; a single writer worker persists them into one SQLite database
//! per metric; consumers query time windows back out with SQL aggregation
//! and optional downsampling.
//!
//! # Architecture
//!
//! - The **datastore** owns the sample queue, the per-metric store cache,
//!   and the writer worker that drains the queue in batches.
//! - The **statistics** sampler derives per-second put/write rates, which
//!   the writer feeds back into the database as `tsdb.internal.*` metrics.
//! - The **network front-ends** (telnet ingest, axum HTTP API) translate
//!   wire activity into queue and query calls.
//!
//! # Example
//!
//! ```no_run
//! use daemon::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod datastore;
pub mod routes;
pub mod state;
pub mod stats;
pub mod telnet;
pub mod worker;

pub use config::Config;
pub use state::AppState;

use crate::datastore::Datastore;
use crate::stats::{Statistics, StatsSampler};
use crate::worker::Worker;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Runs the daemon with configuration from environment variables.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or startup fails.
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the daemon with the provided configuration.
///
/// Startup order: statistics sampler, datastore writer (which scans the
/// data directory before any sample is processed), telnet listener, HTTP
/// listener. Shutdown runs in reverse network-first order, and stopping the
/// writer drains everything still queued before connections close.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created, a worker fails
/// to start, or a listener fails to bind. Runtime errors after startup are
/// logged and never tear the daemon down.
pub async fn run_server_with_config(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_path).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.data_path.display()
        )
    })?;

    tracing::info!(sqlite = rusqlite::version(), "starting tsdbd");

    let stats = Arc::new(Statistics::new());
    let mut stats_worker = Worker::spawn("statistics", StatsSampler::new(Arc::clone(&stats)))
        .context("failed to start statistics")?;

    let (datastore, writer) = Datastore::new(
        config.data_path.clone(),
        config.db_ext.clone(),
        config.hostname.clone(),
        Arc::clone(&stats),
    );
    let mut writer_worker = Worker::spawn("datastore", writer).context("failed to start datastore")?;

    let state = AppState::new(datastore, stats);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let telnet_task = if config.telnet_port == 0 {
        None
    } else {
        let addr = config.telnet_socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind telnet listener on {addr}"))?;
        tracing::info!(%addr, "telnet interface running");
        Some(tokio::spawn(telnet::run(
            listener,
            state.clone(),
            shutdown_rx.clone(),
        )))
    };

    let http_task = if config.http_port == 0 {
        None
    } else {
        let addr = config.http_socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
        tracing::info!(%addr, "HTTP interface running");

        let app = create_router(state.clone());
        let mut http_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = http_shutdown.changed().await;
                })
                .await;
            if let Err(error) = served {
                tracing::error!(%error, "HTTP server failed");
            }
            tracing::info!("HTTP interface stopped");
        }))
    };

    tracing::info!("tsdbd started");
    shutdown_signal().await;

    // shutdown order: HTTP, telnet, datastore (drains the queue), statistics
    let _ = shutdown_tx.send(true);
    if let Some(task) = http_task {
        let _ = task.await;
    }
    if let Some(task) = telnet_task {
        let _ = task.await;
    }
    writer_worker.stop();
    stats_worker.stop();

    tracing::info!("tsdbd stopped");
    Ok(())
}

/// Creates the application router with all routes and middleware.
///
/// Public so tests can drive the API without binding a socket.
pub fn create_router(state: AppState) -> Router {
    routes::api_routes(state).layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or ctrl-c).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received ctrl-c, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
