//! ARBOR - Store Engine Module
//! Top-level module tying the key codec, entry table, expiration policy,
//! range scanner, bulk deleter and vacuum together.

pub mod bulk;
pub mod concurrent;
pub mod continuation;
pub mod keycodec;
pub mod metrics;
pub mod scan;
pub mod scheduler;
pub mod table;
pub mod ttl;
pub mod wal;

use crate::config::Config;
use crate::error::Result;
use crate::types::{
    DeleteAllOutcome, Entry, EntryView, Key, ListOptions, ListPage, SetOptions, Timestamp,
    VacuumOutcome, Value,
};

use self::continuation::{Continuation, ContinuationQueue};
use self::metrics::EngineMetrics;
use self::table::EntryTable;
use self::wal::WriteAheadLog;

/// The core Arbor store.
///
/// Every mutation is logged to the WAL before the entry table changes, and
/// each call touches the table as one atomic unit. Range operations are not
/// snapshot-isolated across calls.
pub struct Arbor {
    /// Ordered table of entries keyed by encoded path.
    table: EntryTable,
    /// Write-ahead log for crash recovery.
    wal: WriteAheadLog,
    /// Bulk work deferred to later, independent invocations.
    continuations: ContinuationQueue,
    /// Operation counters.
    metrics: EngineMetrics,
    config: Config,
}

impl Arbor {
    /// Open or create an Arbor store at the configured path.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        config.ensure_dirs()?;

        let wal_path = config.data_dir.join("arbor.wal");
        let table = WriteAheadLog::recover(&wal_path)?;
        let wal = WriteAheadLog::open(wal_path, config.sync_writes)?;

        let metrics = EngineMetrics::new();
        metrics.record_recovery();

        log::info!(
            "Arbor store opened at {:?} ({} entries recovered, {} with expiration)",
            config.data_dir,
            table.len(),
            table.expiring_len()
        );

        Ok(Self {
            table,
            wal,
            continuations: ContinuationQueue::new(),
            metrics,
            config,
        })
    }

    /// Fetch the live entry at `key`.
    /// Returns `None` if the key does not exist or has expired.
    pub fn get<S: AsRef<str>>(&self, key: &[S]) -> Result<Option<Entry>> {
        let path = keycodec::encode(key)?;
        let now = ttl::now_ms();
        let found = self.live_entry(&path, now).cloned();
        self.metrics
            .record_get(found.as_ref().map(|e| e.value.len()));
        Ok(found)
    }

    /// Whether a live entry exists at `key`.
    pub fn has<S: AsRef<str>>(&self, key: &[S]) -> Result<bool> {
        let path = keycodec::encode(key)?;
        let now = ttl::now_ms();
        let found = self.live_entry(&path, now).is_some();
        self.metrics.record_get(None);
        Ok(found)
    }

    fn live_entry(&self, path: &str, now: Timestamp) -> Option<&Entry> {
        let entry = self.table.get(path)?;
        if ttl::is_live(entry.expires_at, now) {
            Some(entry)
        } else {
            self.metrics.record_expired_hidden(1);
            None
        }
    }

    /// Create or fully replace the entry at `key`.
    ///
    /// Value, metadata, `updated_at` and expiration are all replaced. A write
    /// without `ttl_ms` or `expires_at` clears any previous expiration.
    pub fn set<S: AsRef<str>>(&mut self, key: &[S], value: Value, options: SetOptions) -> Result<()> {
        let path = keycodec::encode(key)?;
        let now = ttl::now_ms();
        let entry = Entry {
            key: key.iter().map(|s| s.as_ref().to_string()).collect(),
            value,
            metadata: options.metadata,
            updated_at: now,
            expires_at: ttl::resolve_expiration(options.ttl_ms, options.expires_at, now),
        };
        let payload = entry.value.len() + entry.metadata.as_ref().map_or(0, Vec::len);

        // Step 1: Write to WAL first (durability)
        self.wal.append_set(&entry)?;
        // Step 2: Apply to the table
        self.table.upsert(path, entry);

        self.metrics.record_set(payload);
        Ok(())
    }

    /// Remove the entry at `key`. Deleting an absent key is a no-op.
    pub fn delete<S: AsRef<str>>(&mut self, key: &[S]) -> Result<()> {
        let path = keycodec::encode(key)?;
        if self.table.get(&path).is_none() {
            return Ok(());
        }
        self.wal.append_delete(std::slice::from_ref(&path))?;
        self.table.remove(&path);
        self.metrics.record_delete();
        Ok(())
    }

    /// One page of live entries under `prefix`, in encoded-path order.
    pub fn list<S: AsRef<str>>(&self, prefix: &[S], options: &ListOptions) -> Result<ListPage> {
        let range = keycodec::prefix_range(prefix)?;
        let now = ttl::now_ms();
        let page = scan::list_page(
            &self.table,
            &range,
            options.cursor.as_ref(),
            options.limit,
            options.include_values,
            now,
        );
        self.metrics.record_scan();
        Ok(page)
    }

    /// Up to `get_all_limit` live entries under `prefix` in a single call.
    /// Larger subtrees must be paged with `list`.
    pub fn get_all<S: AsRef<str>>(&self, prefix: &[S], include_values: bool) -> Result<Vec<EntryView>> {
        let range = keycodec::prefix_range(prefix)?;
        let now = ttl::now_ms();
        let entries = scan::collect_live(
            &self.table,
            &range,
            self.config.get_all_limit,
            include_values,
            now,
        );
        self.metrics.record_scan();
        Ok(entries)
    }

    /// Delete one batch of entries (live or expired) under `prefix`.
    ///
    /// If the subtree is larger than one batch, a continuation for the same
    /// prefix is queued and `has_more` is set; the rest of the subtree is
    /// removed by later invocations (`run_pending` or the background
    /// continuation task), never within this call.
    pub fn delete_all<S: AsRef<str>>(&mut self, prefix: &[S]) -> Result<DeleteAllOutcome> {
        let range = keycodec::prefix_range(prefix)?;
        let batch = bulk::select_subtree_batch(&self.table, &range, self.config.delete_batch_size);
        let deleted_count = batch.paths.len();

        if deleted_count > 0 {
            self.wal.append_delete(&batch.paths)?;
            for path in &batch.paths {
                self.table.remove(path);
            }
        }

        if batch.has_more {
            let prefix: Key = prefix.iter().map(|s| s.as_ref().to_string()).collect();
            self.continuations.push(Continuation::DeleteAll { prefix });
        }

        log::debug!(
            "delete_all {:?}: removed {} entries (has_more: {})",
            range.lower(),
            deleted_count,
            batch.has_more
        );
        self.metrics.record_bulk_delete(deleted_count);

        Ok(DeleteAllOutcome {
            deleted_count,
            has_more: batch.has_more,
        })
    }

    /// Run the oldest queued continuation as its own invocation.
    /// Returns `None` when nothing is pending.
    pub fn run_pending(&mut self) -> Result<Option<DeleteAllOutcome>> {
        let Some(continuation) = self.continuations.pop() else {
            return Ok(None);
        };
        self.metrics.record_continuation();
        match continuation {
            Continuation::DeleteAll { prefix } => match self.delete_all(&prefix) {
                Ok(outcome) => Ok(Some(outcome)),
                Err(e) => {
                    // The batch never reached the table; keep the work queued.
                    log::warn!("delete_all continuation for {:?} failed: {}", prefix, e);
                    self.continuations.push(Continuation::DeleteAll { prefix });
                    Err(e)
                }
            },
        }
    }

    /// Number of queued continuations.
    pub fn pending_continuations(&self) -> usize {
        self.continuations.len()
    }

    /// Remove up to `vacuum_batch_size` entries whose expiration has passed.
    ///
    /// Intended for periodic invocation; a single pass never reschedules
    /// itself. Entries without an expiration are never touched.
    pub fn vacuum(&mut self) -> Result<VacuumOutcome> {
        let now = ttl::now_ms();
        let paths = bulk::select_vacuum_batch(&self.table, now, self.config.vacuum_batch_size);
        if paths.is_empty() {
            return Ok(VacuumOutcome { count: 0 });
        }

        self.wal.append_delete(&paths)?;
        let mut count = 0;
        for path in &paths {
            if self.table.remove(path).is_some() {
                count += 1;
            }
        }

        log::info!("vacuum removed {} expired entries", count);
        self.metrics.record_vacuum(count);
        Ok(VacuumOutcome { count })
    }

    /// Rewrite the WAL to contain only the current table contents.
    pub fn compact_log(&mut self) -> Result<()> {
        let before = self.wal.file_size()?;
        self.wal.rewrite(&self.table)?;
        log::info!(
            "WAL compacted: {} -> {} bytes",
            before,
            self.wal.file_size()?
        );
        Ok(())
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Approximate in-memory size of the table in bytes.
    pub fn size_bytes(&self) -> usize {
        self.table.size()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
