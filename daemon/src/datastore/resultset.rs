//! Prepared query execution.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use shared::models::DataPoint;
use shared::query::MetricQuery;
use std::path::Path;

/// A single-shot query handle bound to one per-metric database.
///
/// A result set owns a dedicated read-only connection, so prepared
/// statements never cross threads and the writer's connection stays
/// untouched. It carries the originating metric name and the opaque
/// downsampler spec alongside the compiled SQL.
#[derive(Debug)]
pub struct ResultSet {
    conn: Connection,
    sql: String,
    metric: String,
    downsampler: String,
}

impl ResultSet {
    pub(crate) fn open(path: &Path, query: &MetricQuery) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open {} for query", path.display()))?;

        Ok(Self {
            conn,
            sql: query.sql.clone(),
            metric: query.metric.clone(),
            downsampler: query.downsampler.clone(),
        })
    }

    /// The metric name this result set was prepared for.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// The opaque downsampler spec carried from the query.
    #[must_use]
    pub fn downsampler(&self) -> &str {
        &self.downsampler
    }

    /// Executes the query over the inclusive `[start_time, end_time]`
    /// window, returning rows in the order the engine produces them.
    ///
    /// # Errors
    ///
    /// Returns an error if preparing or stepping the statement fails.
    pub fn execute(&self, start_time: u64, end_time: u64) -> Result<Vec<DataPoint>> {
        let mut stmt = self
            .conn
            .prepare(&self.sql)
            .with_context(|| format!("failed to prepare query for {}", self.metric))?;

        let rows = stmt.query_map(params![start_time as i64, end_time as i64], |row| {
            Ok(DataPoint::new(
                row.get::<_, i64>(0)? as u64,
                row.get::<_, f64>(1)?,
            ))
        })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row?);
        }
        Ok(points)
    }
}
