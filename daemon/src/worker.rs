//! Cooperative worker lifecycle.
//!
//! A [`Worker`] owns a long-lived OS thread driving a [`WorkerProc`] through
//! a start/process/stop lifecycle. The procedure's `process` is called
//! repeatedly while the worker runs and is responsible for its own pacing
//! (typically sleeping briefly when idle).

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

/// The capability set a worker drives.
pub trait WorkerProc: Send + 'static {
    /// Runs once on the worker thread before the processing loop.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the worker; [`Worker::spawn`] relays the
    /// error to the caller, which treats it as fatal to startup.
    fn start(&mut self) -> Result<()>;

    /// Runs repeatedly while the worker is running.
    fn process(&mut self);

    /// Runs once after the processing loop exits.
    fn stop(&mut self);
}

/// A thread-backed worker with a cooperative stop flag.
#[derive(Debug)]
pub struct Worker {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns a named worker thread and waits for the procedure's `start`
    /// to complete, so no work is processed before startup finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be created or the procedure's
    /// `start` fails.
    pub fn spawn(name: &str, mut proc: impl WorkerProc) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let (started_tx, started_rx) = mpsc::sync_channel::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Err(error) = proc.start() {
                    let _ = started_tx.send(Err(error));
                    return;
                }
                let _ = started_tx.send(Ok(()));

                while flag.load(Ordering::Acquire) {
                    proc.process();
                    thread::yield_now();
                }

                proc.stop();
            })?;

        match started_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                name: name.to_string(),
                running,
                handle: Some(handle),
            }),
            Ok(Err(error)) => {
                let _ = handle.join();
                Err(error)
            }
            Err(_) => {
                let _ = handle.join();
                Err(anyhow::anyhow!("worker '{name}' died during startup"))
            }
        }
    }

    /// Signals the worker to stop and joins its thread, running the
    /// procedure's `stop` before returning. Safe to call more than once.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(worker = %self.name, "worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}
