//! ARBOR - Store Metrics & Observability
//! Atomic counters for tracking store operations in a lock-free,
//! thread-safe manner using `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for the Arbor store.
///
/// All counters use `Ordering::Relaxed`; they are read for reporting only.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Total number of `set` operations.
    pub sets: AtomicU64,
    /// Total number of `get` / `has` lookups.
    pub gets: AtomicU64,
    /// Total number of `delete` calls that removed an entry.
    pub deletes: AtomicU64,
    /// Total number of `list` / `get_all` scans.
    pub scans: AtomicU64,
    /// Expired entries hidden from reads and scans.
    pub expired_hidden: AtomicU64,
    /// Entries removed by `delete_all` batches.
    pub bulk_deleted: AtomicU64,
    /// Entries removed by `vacuum`.
    pub vacuumed: AtomicU64,
    /// Continuations executed.
    pub continuations: AtomicU64,
    /// Total bytes written (values + metadata).
    pub bytes_written: AtomicU64,
    /// Total bytes read (values returned by get).
    pub bytes_read: AtomicU64,
    /// Number of WAL recovery operations.
    pub wal_recoveries: AtomicU64,
    /// Timestamp when the store was opened.
    started: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            sets: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            expired_hidden: AtomicU64::new(0),
            bulk_deleted: AtomicU64::new(0),
            vacuumed: AtomicU64::new(0),
            continuations: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            wal_recoveries: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_set(&self, payload_size: usize) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(payload_size as u64, Ordering::Relaxed);
    }

    /// Record a lookup; `value_size` is `None` on a miss.
    pub fn record_get(&self, value_size: Option<usize>) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if let Some(size) = value_size {
            self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
        }
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired_hidden(&self, count: usize) {
        self.expired_hidden
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_bulk_delete(&self, count: usize) {
        self.bulk_deleted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_vacuum(&self, count: usize) {
        self.vacuumed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_continuation(&self) {
        self.continuations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recovery(&self) {
        self.wal_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Uptime in seconds.
    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Total number of client operations (sets + gets + deletes + scans).
    pub fn total_ops(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
            + self.scans.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ ARBOR Store Metrics ═══\n\
             Operations:\n\
               sets:      {}\n\
               gets:      {}\n\
               deletes:   {}\n\
               scans:     {}\n\
             Expiration:\n\
               hidden:    {}\n\
               vacuumed:  {}\n\
             Bulk:\n\
               deleted:   {}\n\
               continuations: {}\n\
             I/O:\n\
               written:   {} bytes\n\
               read:      {} bytes\n\
             Recovery:\n\
               wal recoveries: {}\n\
             Uptime: {:.2}s",
            self.sets.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.scans.load(Ordering::Relaxed),
            self.expired_hidden.load(Ordering::Relaxed),
            self.vacuumed.load(Ordering::Relaxed),
            self.bulk_deleted.load(Ordering::Relaxed),
            self.continuations.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.wal_recoveries.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
