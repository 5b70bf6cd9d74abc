//! tsdb CLI
//!
//! Command-line companion for the time-series daemon: validate put lines and
//! inspect how query expressions compile, without a running daemon.
//!
//! # Usage
//!
//! ```bash
//! tsdb --help
//! tsdb check "sys.cpu 1700000000 0.5 host=web1"
//! tsdb compile "avg:sys.cpu{host=*}:1m-avg"
//! tsdb reltime 5m-ago
//! ```

#![deny(unsafe_code)]

use clap::{Parser, Subcommand};
use shared::models::Metric;
use shared::query::{parse_rel_time, MetricQuery};

/// tsdb CLI - time-series daemon command-line companion
#[derive(Parser)]
#[command(name = "tsdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a put line (without the `put ` verb prefix)
    Check {
        /// The line, e.g. "sys.cpu 1700000000 0.5 host=web1"
        line: String,
    },
    /// Compile a query expression and print the generated SQL
    Compile {
        /// The expression, e.g. "avg:sys.cpu{host=*}:1m-avg"
        query: String,
    },
    /// Resolve a relative-time token into seconds
    Reltime {
        /// The token, e.g. "5m-ago"
        token: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check { line }) => match line.parse::<Metric>() {
            Ok(metric) => println!("ok: {metric}"),
            Err(error) => anyhow::bail!("invalid put line: {error}"),
        },
        Some(Commands::Compile { query }) => {
            let compiled = MetricQuery::parse(&query)?;
            println!("metric: {}", compiled.metric);
            println!("sql: {}", compiled.sql);
            if !compiled.downsampler.is_empty() {
                println!("downsampler: {}", compiled.downsampler);
            }
        }
        Some(Commands::Reltime { token }) => {
            println!("{}", parse_rel_time(&token));
        }
        None => {
            println!("tsdb CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
