//! tsdbd daemon binary.
//!
//! Entry point for the time-series database daemon.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use daemon::Config;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));

    // log to a file under the configured directory, or to stdout
    match &config.log_path {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file = File::options()
                .create(true)
                .append(true)
                .open(dir.join("tsdbd.log"))
                .with_context(|| format!("failed to open log file in {}", dir.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    daemon::run_server_with_config(config).await
}
