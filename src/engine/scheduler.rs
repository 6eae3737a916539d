//! ARBOR - Background Maintenance Scheduler
//! Drives periodic work (vacuum, bulk-delete continuations) from outside
//! the read/write path. One thread per task, woken on a fixed interval.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{ArborError, Result};

use super::concurrent::ConcurrentArbor;

/// A unit of work run periodically by the `Scheduler`.
pub trait BackgroundTask: Send + Sync {
    /// Task name for logging.
    fn name(&self) -> &'static str;

    /// How often to run this task.
    fn interval(&self) -> Duration;

    /// Execute one tick of the task.
    fn execute(&self) -> Result<()>;
}

struct Worker {
    name: &'static str,
    /// Dropping the sender wakes the worker and stops it.
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs registered tasks on their own threads until `shutdown`.
pub struct Scheduler {
    workers: Mutex<Vec<Worker>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Register a periodic background task.
    pub fn register<T: BackgroundTask + 'static>(&self, task: Arc<T>) -> Result<&Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let name = task.name();
        let interval = task.interval();

        let handle = thread::Builder::new()
            .name(format!("arbor-{}", name))
            .spawn(move || {
                let mut run_id = 0u64;
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            run_id += 1;
                            if let Err(e) = task.execute() {
                                log::error!("task {} run {} failed: {}", name, run_id, e);
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                            log::info!("task {} shutting down after {} runs", name, run_id);
                            break;
                        }
                    }
                }
            })?;

        self.workers
            .lock()
            .map_err(|_| ArborError::LockPoisoned)?
            .push(Worker { name, stop, handle });
        Ok(self)
    }

    /// Number of running tasks.
    pub fn task_count(&self) -> usize {
        self.workers.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Signal all tasks to stop and wait for them to finish.
    pub fn shutdown(self) -> Result<()> {
        let workers = self
            .workers
            .into_inner()
            .map_err(|_| ArborError::LockPoisoned)?;
        for worker in workers {
            drop(worker.stop);
            if worker.handle.join().is_err() {
                log::error!("task {} panicked", worker.name);
            }
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically reclaims expired entries, one bounded batch per tick.
pub struct VacuumTask {
    store: ConcurrentArbor,
    interval: Duration,
}

impl VacuumTask {
    pub fn new(store: ConcurrentArbor, interval: Duration) -> Self {
        Self { store, interval }
    }
}

impl BackgroundTask for VacuumTask {
    fn name(&self) -> &'static str {
        "vacuum"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn execute(&self) -> Result<()> {
        let outcome = self.store.vacuum()?;
        if outcome.count > 0 {
            log::debug!("scheduled vacuum removed {} entries", outcome.count);
        }
        Ok(())
    }
}

/// Drains queued `delete_all` continuations.
pub struct ContinuationTask {
    store: ConcurrentArbor,
    interval: Duration,
}

impl ContinuationTask {
    pub fn new(store: ConcurrentArbor, interval: Duration) -> Self {
        Self { store, interval }
    }
}

impl BackgroundTask for ContinuationTask {
    fn name(&self) -> &'static str {
        "continuations"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn execute(&self) -> Result<()> {
        let runs = self.store.drain_pending()?;
        if runs > 0 {
            log::debug!("ran {} queued continuations", runs);
        }
        Ok(())
    }
}
