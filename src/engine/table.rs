//! ARBOR - Entry Table (Ordered In-Memory Store)
//! The table holds every entry, live or expired, keyed by encoded path.
//! All mutations go through the write-ahead log first.

use std::collections::BTreeMap;

use crate::types::{Entry, Timestamp};

use super::keycodec::PathRange;
use super::ttl::TtlIndex;

/// Sorted map of encoded path -> entry, plus the expiration index.
pub struct EntryTable {
    /// Primary ordering; the encoded path is the uniqueness key.
    entries: BTreeMap<String, Entry>,
    /// Secondary ordering by `expires_at`.
    expirations: TtlIndex,
    /// Current approximate size in bytes.
    size_bytes: usize,
}

impl EntryTable {
    /// Create a new, empty table.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            expirations: TtlIndex::new(),
            size_bytes: 0,
        }
    }

    /// Returns the approximate size of the table in bytes.
    pub fn size(&self) -> usize {
        self.size_bytes
    }

    /// Returns the number of stored entries, including expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying an expiration.
    pub fn expiring_len(&self) -> usize {
        self.expirations.len()
    }

    /// Raw lookup; does not apply liveness.
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Insert or fully replace the entry at `path`.
    /// Returns the previous entry, if any.
    pub fn upsert(&mut self, path: String, entry: Entry) -> Option<Entry> {
        let previous = self.remove(&path);
        self.size_bytes += path.len() + entry.footprint();
        if let Some(expires_at) = entry.expires_at {
            self.expirations.insert(expires_at, path.clone());
        }
        self.entries.insert(path, entry);
        previous
    }

    /// Remove the entry at `path`. Absent paths are a no-op.
    pub fn remove(&mut self, path: &str) -> Option<Entry> {
        let old = self.entries.remove(path)?;
        if let Some(expires_at) = old.expires_at {
            self.expirations.remove(expires_at, path);
        }
        self.size_bytes = self
            .size_bytes
            .saturating_sub(path.len() + old.footprint());
        Some(old)
    }

    /// Iterate entries in `range`, ascending, resuming strictly after `after`.
    pub fn range<'a>(
        &'a self,
        range: &'a PathRange,
        after: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a String, &'a Entry)> + 'a {
        range
            .bounds_after(after)
            .map(|bounds| self.entries.range::<str, _>(bounds))
            .into_iter()
            .flatten()
    }

    /// Up to `limit` paths whose expiration is strictly before `now`.
    pub fn expired_paths(&self, now: Timestamp, limit: usize) -> Vec<String> {
        self.expirations.expired_before(now, limit)
    }

    /// Iterate over every stored entry in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }
}

impl Default for EntryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::keycodec::{encode, prefix_range};

    fn entry(key: &[&str], value: &[u8], expires_at: Option<Timestamp>) -> (String, Entry) {
        let path = encode(key).unwrap();
        let entry = Entry {
            key: key.iter().map(|s| s.to_string()).collect(),
            value: value.to_vec(),
            metadata: None,
            updated_at: 1,
            expires_at,
        };
        (path, entry)
    }

    fn insert(table: &mut EntryTable, key: &[&str], value: &[u8], expires_at: Option<Timestamp>) {
        let (path, entry) = entry(key, value, expires_at);
        table.upsert(path, entry);
    }

    #[test]
    fn test_upsert_and_get() {
        let mut table = EntryTable::new();
        insert(&mut table, &["users", "1"], b"alice", None);
        let found = table.get(&encode(&["users", "1"]).unwrap()).unwrap();
        assert_eq!(found.value, b"alice");
    }

    #[test]
    fn test_overwrite_replaces_expiration_index() {
        let mut table = EntryTable::new();
        insert(&mut table, &["k"], b"old", Some(10));
        assert_eq!(table.expiring_len(), 1);

        insert(&mut table, &["k"], b"new", None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.expiring_len(), 0);
        assert!(table.expired_paths(u64::MAX, 10).is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = EntryTable::new();
        insert(&mut table, &["k"], b"v", Some(10));
        assert!(table.remove("k").is_some());
        assert!(table.remove("k").is_none());
        assert_eq!(table.expiring_len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_range_respects_hierarchy() {
        let mut table = EntryTable::new();
        insert(&mut table, &["a"], b"parent", None);
        insert(&mut table, &["a", "b"], b"child", None);
        insert(&mut table, &["aa"], b"sibling", None);

        let range = prefix_range(&["a"]).unwrap();
        let keys: Vec<_> = table.range(&range, None).map(|(_, e)| e.key.clone()).collect();
        assert_eq!(keys, vec![vec!["a".to_string()], vec!["a".into(), "b".into()]]);
    }

    #[test]
    fn test_range_resumes_after_cursor() {
        let mut table = EntryTable::new();
        for i in 0..5 {
            insert(&mut table, &["p", i.to_string().as_str()], b"v", None);
        }
        let range = prefix_range(&["p"]).unwrap();
        let after = encode(&["p", "2"]).unwrap();
        let rest: Vec<_> = table.range(&range, Some(&after)).map(|(p, _)| p.clone()).collect();
        assert_eq!(rest, vec![encode(&["p", "3"]).unwrap(), encode(&["p", "4"]).unwrap()]);

        // Cursor beyond the range yields nothing instead of panicking.
        assert_eq!(table.range(&range, Some("zzz")).count(), 0);
    }

    #[test]
    fn test_size_tracking() {
        let mut table = EntryTable::new();
        assert_eq!(table.size(), 0);
        insert(&mut table, &["abc"], b"12345", None); // path 3 + key 3 + value 5
        assert_eq!(table.size(), 11);
        insert(&mut table, &["abc"], b"12", Some(5)); // replace: value 2
        assert_eq!(table.size(), 8);
        table.remove(&encode(&["abc"]).unwrap());
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
        assert_eq!(table.expiring_len(), 0);
    }
}
