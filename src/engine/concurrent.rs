//! ARBOR - Concurrent Store Handle
//! Thread-safe wrapper around the Arbor store using Arc + RwLock.
//!
//! ## Concurrency Model
//! - **Read operations** (`get`, `has`, `list`, `get_all`) acquire a **read lock** (shared)
//! - **Write operations** (`set`, `delete`, `delete_all`, `vacuum`, ...) acquire a **write lock** (exclusive)
//! - Each call is one independent unit of work; no lock is held across calls
//!
//! Bulk continuations are drained one invocation per lock acquisition, so
//! readers interleave with a long-running subtree deletion.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::{ArborError, Result};
use crate::types::{
    DeleteAllOutcome, Entry, EntryView, ListOptions, ListPage, SetOptions, VacuumOutcome, Value,
};

use super::metrics::EngineMetrics;
use super::scheduler::{ContinuationTask, Scheduler, VacuumTask};
use super::Arbor;

/// Thread-safe, cloneable handle to an Arbor store.
///
/// ## Example
/// ```no_run
/// use arbor::engine::concurrent::ConcurrentArbor;
/// use arbor::config::Config;
/// use arbor::types::SetOptions;
/// use std::thread;
///
/// let store = ConcurrentArbor::open(Config::default()).unwrap();
/// let writer = store.clone();
///
/// thread::spawn(move || {
///     writer.set(&["users", "1"], b"alice".to_vec(), SetOptions::new()).unwrap();
/// });
///
/// let _ = store.get(&["users", "1"]);
/// ```
#[derive(Clone)]
pub struct ConcurrentArbor {
    inner: Arc<RwLock<Arbor>>,
}

impl ConcurrentArbor {
    /// Open or create a concurrent Arbor store.
    pub fn open(config: Config) -> Result<Self> {
        let engine = Arbor::open(config)?;
        Ok(Self::from_engine(engine))
    }

    /// Wrap an already opened store.
    pub fn from_engine(engine: Arbor) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arbor>> {
        self.inner.read().map_err(|_| ArborError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arbor>> {
        self.inner.write().map_err(|_| ArborError::LockPoisoned)
    }

    /// Get a live entry (read lock).
    pub fn get<S: AsRef<str>>(&self, key: &[S]) -> Result<Option<Entry>> {
        self.read()?.get(key)
    }

    /// Check for a live entry (read lock).
    pub fn has<S: AsRef<str>>(&self, key: &[S]) -> Result<bool> {
        self.read()?.has(key)
    }

    /// Create or replace an entry (write lock).
    pub fn set<S: AsRef<str>>(&self, key: &[S], value: Value, options: SetOptions) -> Result<()> {
        self.write()?.set(key, value, options)
    }

    /// Delete an entry (write lock).
    pub fn delete<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.write()?.delete(key)
    }

    /// One page of a prefix scan (read lock).
    pub fn list<S: AsRef<str>>(&self, prefix: &[S], options: &ListOptions) -> Result<ListPage> {
        self.read()?.list(prefix, options)
    }

    /// All live entries under a prefix, capped (read lock).
    pub fn get_all<S: AsRef<str>>(&self, prefix: &[S], include_values: bool) -> Result<Vec<EntryView>> {
        self.read()?.get_all(prefix, include_values)
    }

    /// Delete one batch under a prefix (write lock).
    pub fn delete_all<S: AsRef<str>>(&self, prefix: &[S]) -> Result<DeleteAllOutcome> {
        self.write()?.delete_all(prefix)
    }

    /// Run one queued continuation (write lock).
    pub fn run_pending(&self) -> Result<Option<DeleteAllOutcome>> {
        self.write()?.run_pending()
    }

    /// Run queued continuations until none remain, one lock acquisition each.
    /// Returns the number of invocations executed.
    pub fn drain_pending(&self) -> Result<usize> {
        let mut runs = 0;
        while self.run_pending()?.is_some() {
            runs += 1;
        }
        Ok(runs)
    }

    /// Number of queued continuations (read lock).
    pub fn pending_continuations(&self) -> Result<usize> {
        Ok(self.read()?.pending_continuations())
    }

    /// One bounded vacuum pass (write lock).
    pub fn vacuum(&self) -> Result<VacuumOutcome> {
        self.write()?.vacuum()
    }

    /// Compact the write-ahead log (write lock).
    pub fn compact_log(&self) -> Result<()> {
        self.write()?.compact_log()
    }

    /// Number of stored entries (read lock).
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Run `f` against the metrics while holding the read lock.
    pub fn with_metrics<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&EngineMetrics) -> R,
    {
        let engine = self.read()?;
        Ok(f(engine.metrics()))
    }

    /// Start the background vacuum and continuation tasks using the
    /// intervals from the store's config.
    pub fn start_maintenance(&self) -> Result<Scheduler> {
        let (vacuum_interval, continuation_interval) = {
            let engine = self.read()?;
            let config = engine.config();
            (config.vacuum_interval, config.continuation_interval)
        };
        let scheduler = Scheduler::new();
        scheduler.register(Arc::new(VacuumTask::new(self.clone(), vacuum_interval)))?;
        scheduler.register(Arc::new(ContinuationTask::new(
            self.clone(),
            continuation_interval,
        )))?;
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn temp_store() -> (tempfile::TempDir, ConcurrentArbor) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path()).with_sync_writes(false);
        let store = ConcurrentArbor::open(config).unwrap();
        (dir, store)
    }

    #[test]
    fn test_concurrent_set_get() {
        let (_dir, store) = temp_store();
        store.set(&["test"], b"value".to_vec(), SetOptions::new()).unwrap();
        assert_eq!(store.get(&["test"]).unwrap().unwrap().value, b"value");
    }

    #[test]
    fn test_clone_and_share() {
        let (_dir, store) = temp_store();
        let clone = store.clone();
        clone.set(&["shared"], b"data".to_vec(), SetOptions::new()).unwrap();
        assert!(store.has(&["shared"]).unwrap());
    }

    #[test]
    fn test_concurrent_writers() {
        let (_dir, store) = temp_store();
        let mut handles = vec![];

        for i in 0..5 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let id = i.to_string();
                store
                    .set(&["writers", id.as_str()], id.clone().into_bytes(), SetOptions::new())
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_all(&["writers"], true).unwrap().len(), 5);
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = temp_store();
        let mut handles = vec![];
        for i in 0..8u8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                store.set(&["contended"], vec![i], SetOptions::new()).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(&["contended"]).unwrap().unwrap().value.len(), 1);
    }

    #[test]
    fn test_drain_pending_clears_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path())
            .with_sync_writes(false)
            .with_delete_batch_size(10);
        let store = ConcurrentArbor::open(config).unwrap();
        for i in 0..35 {
            store
                .set(&["tree", format!("{:02}", i).as_str()], vec![0], SetOptions::new())
                .unwrap();
        }

        let first = store.delete_all(&["tree"]).unwrap();
        assert!(first.has_more);
        assert_eq!(store.drain_pending().unwrap(), 3);
        assert!(store.get_all(&["tree"], false).unwrap().is_empty());
        assert_eq!(store.pending_continuations().unwrap(), 0);
    }

    #[test]
    fn test_metrics_access() {
        let (_dir, store) = temp_store();
        store.set(&["m"], b"value".to_vec(), SetOptions::new()).unwrap();
        let ops = store.with_metrics(|m| m.total_ops()).unwrap();
        assert!(ops > 0);
    }
}
