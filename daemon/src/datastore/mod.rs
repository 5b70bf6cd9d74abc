//! Sample persistence.
//!
//! The datastore sits between the network front-ends and the disk: producers
//! enqueue parsed samples through a shared [`Datastore`] handle, and a single
//! [`DatastoreWriter`] worker drains the queue into per-metric SQLite stores.
//! The writer exclusively owns every database connection; the query path
//! only consults a lock-protected catalog of metric names and opens its own
//! read-only connections.

mod resultset;
mod store;

pub use resultset::ResultSet;
pub use store::MetricDb;

use crate::stats::Statistics;
use crate::worker::WorkerProc;
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use shared::models::Metric;
use shared::query::MetricQuery;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

/// Samples pulled from the queue per batch.
const BULK_COUNT: usize = 10;
/// Writer sleep when the queue is empty.
const IDLE_SLEEP: Duration = Duration::from_millis(50);

/// Shared handle to the sample queue and the store catalog.
///
/// Cloned freely across network handlers; the heavy lifting happens on the
/// writer worker created alongside it.
#[derive(Debug)]
pub struct Datastore {
    data_dir: PathBuf,
    db_ext: String,
    hostname: String,
    queue: Sender<Metric>,
    depth: AtomicUsize,
    catalog: RwLock<HashMap<String, PathBuf>>,
    stats: Arc<Statistics>,
}

impl Datastore {
    /// Creates the datastore handle together with its writer worker
    /// procedure. The writer must be driven by a [`crate::worker::Worker`]
    /// before queued samples reach disk.
    #[must_use]
    pub fn new(
        data_dir: PathBuf,
        db_ext: String,
        hostname: String,
        stats: Arc<Statistics>,
    ) -> (Arc<Self>, DatastoreWriter) {
        let (queue, samples) = crossbeam_channel::unbounded();

        let datastore = Arc::new(Self {
            data_dir,
            db_ext,
            hostname,
            queue,
            depth: AtomicUsize::new(0),
            catalog: RwLock::new(HashMap::new()),
            stats,
        });

        let writer = DatastoreWriter {
            datastore: Arc::clone(&datastore),
            samples,
            stores: HashMap::new(),
        };

        (datastore, writer)
    }

    /// Enqueues one sample for the writer. Never blocks; once a metric has
    /// parsed, its sample is accepted.
    pub fn queue_metric(&self, metric: Metric) {
        self.depth.fetch_add(1, Ordering::Relaxed);
        // an unbounded channel only errors once the writer is gone, at
        // which point the sample is moot anyway
        let _ = self.queue.send(metric);
    }

    /// The number of samples currently queued.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Prepares a compiled query against the store for its metric.
    ///
    /// Returns `None` when no store exists for the metric. The returned
    /// [`ResultSet`] owns a dedicated read-only connection, so this never
    /// touches the writer's connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the store's database cannot be opened.
    ///
    /// # Panics
    ///
    /// Panics if the catalog lock is poisoned.
    pub fn prepare_query(&self, query: &MetricQuery) -> Result<Option<ResultSet>> {
        let path = {
            let catalog = self.catalog.read().expect("store catalog lock poisoned");
            catalog.get(&query.metric).cloned()
        };

        match path {
            Some(path) => Ok(Some(ResultSet::open(&path, query)?)),
            None => Ok(None),
        }
    }

    /// The statistics sink shared with the writer.
    #[must_use]
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    fn store_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.{}", self.db_ext))
    }

    fn register(&self, name: &str, path: PathBuf) {
        self.catalog
            .write()
            .expect("store catalog lock poisoned")
            .insert(name.to_string(), path);
    }
}

/// The writer worker.
///
/// Owns every SQLite connection, drains the queue in bulk, creates stores
/// on first sight of a metric, and feeds the daemon's own rates back through
/// the queue once statistics publish a fresh snapshot.
pub struct DatastoreWriter {
    datastore: Arc<Datastore>,
    samples: Receiver<Metric>,
    stores: HashMap<String, MetricDb>,
}

impl DatastoreWriter {
    /// Opens an existing database file and registers it under `name`.
    fn cache_database(&mut self, name: &str, path: PathBuf) -> Result<()> {
        if self.stores.contains_key(name) {
            tracing::warn!(db = %path.display(), "database already loaded");
            return Ok(());
        }

        let db = MetricDb::open(&path)?;
        self.datastore.register(name, path);
        self.stores.insert(name.to_string(), db);
        Ok(())
    }

    /// Looks up the store for a metric, creating it on first sight.
    fn store_for(&mut self, name: &str) -> Option<&MetricDb> {
        if self.stores.contains_key(name) {
            return self.stores.get(name);
        }

        let path = self.datastore.store_path(name);
        match MetricDb::create(&path) {
            Ok(db) => {
                self.datastore.register(name, path);
                self.stores.insert(name.to_string(), db);
                self.stores.get(name)
            }
            Err(error) => {
                tracing::warn!(metric = %name, %error, "failed to create database");
                None
            }
        }
    }

    /// Writes one sample, returning whether a row landed on disk.
    fn write_sample(&mut self, metric: &Metric) -> bool {
        let Some(db) = self.store_for(&metric.name) else {
            // creation failed; the sample is dropped and the next one retries
            return false;
        };

        if let Err(error) = db.insert(metric) {
            tracing::warn!(metric = %metric.name, %error, "error writing metric");
            return false;
        }
        true
    }

    /// Drains the queue completely, in batches of [`BULK_COUNT`].
    fn drain_queue(&mut self) {
        loop {
            let mut batch = Vec::with_capacity(BULK_COUNT);
            while batch.len() < BULK_COUNT {
                match self.samples.try_recv() {
                    Ok(metric) => batch.push(metric),
                    Err(_) => break,
                }
            }
            if batch.is_empty() {
                break;
            }

            let mut written = 0u64;
            for metric in &batch {
                if self.write_sample(metric) {
                    written += 1;
                }
            }

            self.datastore.stats.add_write_count(written);
            self.datastore.depth.fetch_sub(batch.len(), Ordering::Relaxed);
        }
    }

    /// Feeds the daemon's own rates back through the ingest queue whenever
    /// statistics have published a fresh snapshot.
    fn publish_self_metrics(&mut self) {
        let Some(snapshot) = self.datastore.stats.snapshot(true) else {
            return;
        };

        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        let tags = format!("host={}", self.datastore.hostname);

        for (name, value) in [
            ("tsdb.internal.putspersecond", snapshot.puts_per_second),
            ("tsdb.internal.writespersecond", snapshot.writes_per_second),
            ("tsdb.internal.queuebacklog", snapshot.queue_backlog),
        ] {
            if let Ok(metric) = Metric::new(name, timestamp, value, tags.clone()) {
                self.datastore.queue_metric(metric);
            }
        }
    }
}

impl WorkerProc for DatastoreWriter {
    /// Scans the data directory and caches every store with a valid schema.
    fn start(&mut self) -> Result<()> {
        let dir = self.datastore.data_dir.clone();
        tracing::info!(dir = %dir.display(), "starting datastore");

        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to scan data directory {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to scan data directory {}", dir.display()))?
                .path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.datastore.db_ext.as_str()) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = name.to_string();

            tracing::info!(metric = %name, db = %path.display(), "caching database");
            if let Err(error) = self.cache_database(&name, path.clone()) {
                tracing::warn!(db = %path.display(), %error, "skipping database");
            }
        }

        tracing::info!("datastore started");
        Ok(())
    }

    fn process(&mut self) {
        self.datastore
            .stats
            .set_queue_backlog(self.datastore.queue_depth() as u64);

        if self.datastore.queue_depth() == 0 {
            thread::sleep(IDLE_SLEEP);
        }

        self.drain_queue();
        self.publish_self_metrics();
    }

    /// Finishes writing everything still queued, then closes every store.
    fn stop(&mut self) {
        tracing::info!("datastore stopping");
        self.drain_queue();
        self.stores.clear();
        tracing::info!("datastore stopped");
    }
}
