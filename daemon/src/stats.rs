//! Runtime statistics.
//!
//! Network front-ends bump the put counter, the datastore writer bumps the
//! write counter and backlog gauge, and a sampling worker folds the counters
//! into per-second rates once a second.

use crate::worker::WorkerProc;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Idle sleep between sampler ticks.
const IDLE_SLEEP: Duration = Duration::from_millis(50);

/// A published snapshot of derived rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Samples accepted per second across both front-ends.
    pub puts_per_second: f64,
    /// Rows written per second by the datastore writer.
    pub writes_per_second: f64,
    /// Queue depth at the last publish.
    pub queue_backlog: f64,
}

/// Shared counters plus the most recently published snapshot.
#[derive(Debug, Default)]
pub struct Statistics {
    put_count: AtomicU64,
    write_count: AtomicU64,
    queue_backlog: AtomicU64,
    snapshot: Mutex<StatsSnapshot>,
    updated: AtomicBool,
}

impl Statistics {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds accepted samples to the put counter.
    pub fn add_put_count(&self, count: u64) {
        self.put_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Adds written rows to the write counter.
    pub fn add_write_count(&self, count: u64) {
        self.write_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Records the current queue depth.
    pub fn set_queue_backlog(&self, depth: u64) {
        self.queue_backlog.store(depth, Ordering::Relaxed);
    }

    /// Folds the counters over `elapsed` seconds into a fresh snapshot and
    /// resets them. Driven by the [`StatsSampler`] once a second.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    pub(crate) fn publish(&self, elapsed: f64) {
        let puts = self.put_count.swap(0, Ordering::Relaxed);
        let writes = self.write_count.swap(0, Ordering::Relaxed);

        let snapshot = StatsSnapshot {
            puts_per_second: puts as f64 / elapsed,
            writes_per_second: writes as f64 / elapsed,
            queue_backlog: self.queue_backlog.load(Ordering::Relaxed) as f64,
        };

        *self.snapshot.lock().expect("statistics lock poisoned") = snapshot;
        self.updated.store(true, Ordering::Release);
    }

    /// Returns the last published snapshot and clears the freshness flag.
    ///
    /// With `only_if_updated`, returns `None` unless a publish happened
    /// since the previous read.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot lock is poisoned.
    pub fn snapshot(&self, only_if_updated: bool) -> Option<StatsSnapshot> {
        if only_if_updated && !self.updated.load(Ordering::Acquire) {
            return None;
        }

        let snapshot = *self.snapshot.lock().expect("statistics lock poisoned");
        self.updated.store(false, Ordering::Release);
        Some(snapshot)
    }
}

/// Worker publishing per-second rates at one-second intervals.
#[derive(Debug)]
pub struct StatsSampler {
    stats: Arc<Statistics>,
    last_publish: Instant,
}

impl StatsSampler {
    /// Creates a sampler over the shared statistics.
    #[must_use]
    pub fn new(stats: Arc<Statistics>) -> Self {
        Self {
            stats,
            last_publish: Instant::now(),
        }
    }
}

impl WorkerProc for StatsSampler {
    fn start(&mut self) -> Result<()> {
        self.last_publish = Instant::now();
        Ok(())
    }

    fn process(&mut self) {
        let elapsed = self.last_publish.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.stats.publish(elapsed.as_secs_f64());
            self.last_publish = Instant::now();
        } else {
            thread::sleep(IDLE_SLEEP);
        }
    }

    fn stop(&mut self) {}
}
