//! ARBOR - Bulk Deletion & Vacuum
//! Selects bounded batches of entries to remove.
//!
//! Neither routine mutates the table; the engine logs the selected batch
//! as one WAL frame and then applies it. Both are idempotent: re-running
//! with the same arguments after a crash converges to the same end state.

use crate::types::Timestamp;

use super::keycodec::PathRange;
use super::table::EntryTable;
use super::ttl;

/// A batch of paths selected for deletion under a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBatch {
    pub paths: Vec<String>,
    /// More entries remain in the subtree after this batch.
    pub has_more: bool,
}

/// Pick up to `batch_size` entries (live or expired) from `range`.
///
/// Fetches `batch_size + 1` paths so that the presence of a further entry
/// can be reported without a second scan.
pub fn select_subtree_batch(table: &EntryTable, range: &PathRange, batch_size: usize) -> DeleteBatch {
    let mut paths: Vec<String> = table
        .range(range, None)
        .take(batch_size + 1)
        .map(|(path, _)| path.clone())
        .collect();
    let has_more = paths.len() > batch_size;
    paths.truncate(batch_size);
    DeleteBatch { paths, has_more }
}

/// Pick up to `limit` entries whose expiration is strictly before `now`,
/// oldest expiration first.
///
/// Each candidate is re-checked against the table so an entry rewritten
/// between index lookup and deletion is never removed.
pub fn select_vacuum_batch(table: &EntryTable, now: Timestamp, limit: usize) -> Vec<String> {
    table
        .expired_paths(now, limit)
        .into_iter()
        .filter(|path| {
            table
                .get(path)
                .map_or(false, |entry| ttl::is_reclaimable(entry.expires_at, now))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::keycodec::{encode, prefix_range};
    use crate::types::Entry;

    fn put(table: &mut EntryTable, key: &[&str], expires_at: Option<Timestamp>) {
        table.upsert(
            encode(key).unwrap(),
            Entry {
                key: key.iter().map(|s| s.to_string()).collect(),
                value: b"v".to_vec(),
                metadata: None,
                updated_at: 0,
                expires_at,
            },
        );
    }

    #[test]
    fn test_subtree_batch_reports_more() {
        let mut table = EntryTable::new();
        for i in 0..250 {
            put(&mut table, &["bulk", format!("{:04}", i).as_str()], None);
        }
        put(&mut table, &["bulky"], None);

        let range = prefix_range(&["bulk"]).unwrap();
        let batch = select_subtree_batch(&table, &range, 100);
        assert_eq!(batch.paths.len(), 100);
        assert!(batch.has_more);
        assert_eq!(batch.paths[0], encode(&["bulk", "0000"]).unwrap());
    }

    #[test]
    fn test_subtree_batch_exact_size_has_no_more() {
        let mut table = EntryTable::new();
        for i in 0..100 {
            put(&mut table, &["x", format!("{:03}", i).as_str()], None);
        }
        let range = prefix_range(&["x"]).unwrap();
        let batch = select_subtree_batch(&table, &range, 100);
        assert_eq!(batch.paths.len(), 100);
        assert!(!batch.has_more);
    }

    #[test]
    fn test_subtree_batch_includes_expired() {
        let mut table = EntryTable::new();
        put(&mut table, &["t", "live"], None);
        put(&mut table, &["t", "dead"], Some(1));
        let range = prefix_range(&["t"]).unwrap();
        let batch = select_subtree_batch(&table, &range, 100);
        assert_eq!(batch.paths.len(), 2);
        assert!(!batch.has_more);
    }

    #[test]
    fn test_vacuum_batch_bounded_and_skips_persistent() {
        let mut table = EntryTable::new();
        for i in 0..150 {
            put(&mut table, &["exp", format!("{:03}", i).as_str()], Some(10 + i as u64));
        }
        put(&mut table, &["keep"], None);
        put(&mut table, &["future"], Some(10_000));

        let batch = select_vacuum_batch(&table, 1_000, 100);
        assert_eq!(batch.len(), 100);
        assert!(!batch.contains(&"keep".to_string()));
        assert!(!batch.contains(&"future".to_string()));
        // Oldest expirations go first.
        assert_eq!(batch[0], encode(&["exp", "000"]).unwrap());
    }
}
