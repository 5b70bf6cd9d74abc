//! Per-metric SQLite stores.
//!
//! Each metric name maps to one database file holding a single `METRIC`
//! table. Stores are opened (or created) by the writer worker only.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use shared::models::Metric;
use std::path::{Path, PathBuf};

const SQL_CREATE_TABLE_METRIC: &str =
    "CREATE TABLE METRIC (TIMESTAMP INTEGER NOT NULL, VALUE NUMBER NOT NULL, TAGS TEXT NOT NULL)";
const SQL_VERIFY_TABLE: &str =
    "SELECT COUNT(name) FROM sqlite_master WHERE type='table' AND name=?1";
const SQL_INSERT_METRIC: &str =
    "INSERT INTO METRIC (TIMESTAMP, VALUE, TAGS) VALUES (?1, ?2, ?3)";

/// One open per-metric database.
///
/// The connection is opened without SQLite's internal mutex and must only be
/// used from the writer thread; inserts go through the connection's cached
/// prepared statement.
#[derive(Debug)]
pub struct MetricDb {
    path: PathBuf,
    conn: Connection,
}

impl MetricDb {
    /// Opens an existing store file, validating its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a database, or
    /// has no `METRIC` table.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open database {}", path.display()))?;

        let tables: i64 = conn
            .query_row(SQL_VERIFY_TABLE, params!["METRIC"], |row| row.get(0))
            .with_context(|| format!("failed to inspect schema of {}", path.display()))?;
        if tables == 0 {
            anyhow::bail!("{} has no METRIC table, not a tsdb file", path.display());
        }

        Self::finish_open(conn, path)
    }

    /// Creates a new store file and issues the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the schema fails.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to create database {}", path.display()))?;

        conn.execute(SQL_CREATE_TABLE_METRIC, [])
            .with_context(|| format!("failed to create schema in {}", path.display()))?;

        Self::finish_open(conn, path)
    }

    fn finish_open(conn: Connection, path: &Path) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .with_context(|| format!("failed to enable WAL on {}", path.display()))?;

        // prepare the INSERT now so a broken statement fails the open, not
        // the first write
        conn.prepare_cached(SQL_INSERT_METRIC)
            .map(drop)
            .with_context(|| format!("failed to prepare insert for {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Writes one sample through the prepared INSERT.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or stepping the statement fails; the
    /// caller drops the sample and continues.
    pub fn insert(&self, metric: &Metric) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(SQL_INSERT_METRIC)?;
        stmt.execute(params![metric.timestamp as i64, metric.value, metric.tags])?;
        Ok(())
    }

    /// The database file this store writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
