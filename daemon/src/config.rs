//! Daemon configuration module.
//!
//! Handles loading configuration from environment variables with sensible
//! defaults.

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Log verbosity accepted by the `TSDBD_LOG_LEVEL` key.
///
/// `crit` is accepted for compatibility and maps onto the error filter;
/// unknown values fall back to `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Critical conditions only.
    Crit,
    /// Errors.
    Error,
    /// Warnings and above.
    Warn,
    /// Informational messages and above.
    Info,
    /// Everything, including debug chatter.
    Debug,
}

impl LogLevel {
    /// Parses a level name, falling back to `Info` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "crit" => Self::Crit,
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            _ => Self::Info,
        }
    }

    /// The tracing filter directive equivalent to this level.
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Crit | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Daemon configuration.
///
/// Configuration values can be set via environment variables:
/// - `TSDBD_LOG_PATH`: directory for the log file (default: stdout logging)
/// - `TSDBD_DATA_PATH`: directory holding the per-metric databases (default: "./data")
/// - `TSDBD_LOG_LEVEL`: one of crit|error|warn|info|debug (default: "info")
/// - `TSDBD_DB_EXT`: file extension of per-metric databases (default: "tsdb")
/// - `TSDBD_HOSTNAME`: tag value for the daemon's self-metrics (default: `$HOSTNAME` or "localhost")
/// - `TSDBD_BIND_ADDRESS`: IP both listeners bind to (default: "127.0.0.1")
/// - `TSDBD_TELNET_PORT`: telnet ingest port, 0 disables (default: 2181)
/// - `TSDBD_HTTP_PORT`: HTTP API port, 0 disables (default: 8080)
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the log file; `None` logs to stdout.
    pub log_path: Option<PathBuf>,
    /// Directory holding the per-metric databases.
    pub data_path: PathBuf,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// File extension of per-metric databases, without the dot.
    pub db_ext: String,
    /// Tag value for the daemon's self-metrics.
    pub hostname: String,
    /// IP address both listeners bind to.
    pub bind_address: String,
    /// Telnet ingest port; 0 disables the listener.
    pub telnet_port: u16,
    /// HTTP API port; 0 disables the listener.
    pub http_port: u16,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TSDBD_TELNET_PORT` or `TSDBD_HTTP_PORT` is set
    /// but cannot be parsed as a port number.
    pub fn from_env() -> Result<Self> {
        let log_path = std::env::var("TSDBD_LOG_PATH").ok().map(PathBuf::from);

        let data_path = std::env::var("TSDBD_DATA_PATH")
            .map_or_else(|_| PathBuf::from("./data"), PathBuf::from);

        let log_level = std::env::var("TSDBD_LOG_LEVEL")
            .map_or(LogLevel::Info, |level| LogLevel::parse(&level));

        let db_ext = std::env::var("TSDBD_DB_EXT").unwrap_or_else(|_| "tsdb".to_string());

        let hostname = std::env::var("TSDBD_HOSTNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "localhost".to_string());

        let bind_address =
            std::env::var("TSDBD_BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string());

        let telnet_port = std::env::var("TSDBD_TELNET_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(2181);

        let http_port = std::env::var("TSDBD_HTTP_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(8080);

        Ok(Self {
            log_path,
            data_path,
            log_level,
            db_ext,
            hostname,
            bind_address,
            telnet_port,
            http_port,
        })
    }

    /// Returns the HTTP socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the bind address and port combination cannot be parsed as a
    /// valid socket address.
    #[must_use]
    pub fn http_socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.bind_address, self.http_port)
            .parse()
            .expect("Invalid HTTP socket address from config")
    }

    /// Returns the telnet socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the bind address and port combination cannot be parsed as a
    /// valid socket address.
    #[must_use]
    pub fn telnet_socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.bind_address, self.telnet_port)
            .parse()
            .expect("Invalid telnet socket address from config")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: None,
            data_path: PathBuf::from("./data"),
            log_level: LogLevel::Info,
            db_ext: "tsdb".to_string(),
            hostname: "localhost".to_string(),
            bind_address: "127.0.0.1".to_string(),
            telnet_port: 2181,
            http_port: 8080,
        }
    }
}
