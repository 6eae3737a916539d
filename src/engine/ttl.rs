//! ARBOR - Time-To-Live (TTL) Support
//! Liveness rules for entries and the expiration-ordered secondary index.
//!
//! Expired entries are filtered lazily on every read and reclaimed
//! eagerly, in bounded batches, by `vacuum`.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// Current time in milliseconds since the Unix epoch.
///
/// Operations sample this once and pass the value down, so a single
/// scan never filters against two different clocks.
pub fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// An entry is live iff it has no expiration or expires strictly after `now`.
pub fn is_live(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    match expires_at {
        Some(expires_at) => expires_at > now,
        None => true,
    }
}

/// Whether `vacuum` may reclaim an entry: expiration set and strictly in the past.
pub fn is_reclaimable(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(expires_at, Some(expires_at) if expires_at < now)
}

/// Resolve the absolute expiration for a write.
///
/// A relative `ttl_ms` wins over an explicit `expires_at`. With neither,
/// the entry never expires.
pub fn resolve_expiration(
    ttl_ms: Option<u64>,
    expires_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match ttl_ms {
        Some(ttl) => Some(now.saturating_add(ttl)),
        None => expires_at,
    }
}

/// Remaining lifetime in milliseconds.
/// Returns `None` for entries without expiration and `Some(0)` once expired.
pub fn remaining_ttl(expires_at: Option<Timestamp>, now: Timestamp) -> Option<u64> {
    expires_at.map(|expires_at| expires_at.saturating_sub(now))
}

/// Secondary index ordering encoded paths by expiration time.
///
/// ## Design
/// - `BTreeSet<(expires_at, path)>` keeps entries sorted by expiration,
///   ties broken by path
/// - Only entries with an expiration are indexed
/// - Finding the oldest expired entries is a range scan from the front
#[derive(Debug, Default)]
pub struct TtlIndex {
    by_expiration: BTreeSet<(Timestamp, String)>,
}

impl TtlIndex {
    /// Create a new empty TTL index.
    pub fn new() -> Self {
        Self {
            by_expiration: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, expires_at: Timestamp, path: String) {
        self.by_expiration.insert((expires_at, path));
    }

    pub fn remove(&mut self, expires_at: Timestamp, path: &str) {
        self.by_expiration.remove(&(expires_at, path.to_string()));
    }

    /// Up to `limit` paths whose expiration is strictly before `now`,
    /// oldest first.
    pub fn expired_before(&self, now: Timestamp, limit: usize) -> Vec<String> {
        self.by_expiration
            .iter()
            .take_while(|(expires_at, _)| *expires_at < now)
            .take(limit)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Returns the number of indexed entries.
    pub fn len(&self) -> usize {
        self.by_expiration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_expiration.is_empty()
    }
}
