//! ARBOR - Core Type Definitions
//! Defines fundamental types used across the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArborError;

/// Hierarchical key: an ordered sequence of non-empty string segments.
pub type Key = Vec<String>;

/// Value type for the store.
/// Using Vec<u8> keeps the payload opaque.
pub type Value = Vec<u8>;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A single stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
    /// Auxiliary payload, never interpreted by the store.
    pub metadata: Option<Value>,
    pub updated_at: Timestamp,
    /// `None` means the entry never expires.
    pub expires_at: Option<Timestamp>,
}

impl Entry {
    /// Approximate in-memory footprint used for size accounting.
    pub fn footprint(&self) -> usize {
        self.key.iter().map(String::len).sum::<usize>()
            + self.value.len()
            + self.metadata.as_ref().map_or(0, Vec::len)
    }
}

/// An entry as returned by range scans; `value` is `None`
/// when the caller asked to omit payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub key: Key,
    pub value: Option<Value>,
    pub metadata: Option<Value>,
    pub updated_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl EntryView {
    pub(crate) fn from_entry(entry: &Entry, include_values: bool) -> Self {
        Self {
            key: entry.key.clone(),
            value: include_values.then(|| entry.value.clone()),
            metadata: entry.metadata.clone(),
            updated_at: entry.updated_at,
            expires_at: entry.expires_at,
        }
    }
}

/// Options for `set`.
///
/// When neither `ttl_ms` nor `expires_at` is given, the written entry
/// never expires, even if a previous version of it did.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    pub metadata: Option<Value>,
    /// Time-to-live relative to the write; wins over `expires_at`.
    pub ttl_ms: Option<u64>,
    /// Absolute expiration timestamp (ms since epoch).
    pub expires_at: Option<Timestamp>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    pub fn with_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Default page size for `list`.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Options for `list`.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub limit: usize,
    pub cursor: Option<Cursor>,
    pub include_values: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            cursor: None,
            include_values: true,
        }
    }
}

impl ListOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.include_values = false;
        self
    }
}

/// Opaque pagination token.
///
/// Resumes a scan strictly after the last encoded path examined by the
/// page that produced it. Not snapshot-isolated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    after: Option<String>,
}

impl Cursor {
    /// A cursor positioned before the first entry.
    pub fn start() -> Self {
        Self::default()
    }

    pub(crate) fn after(path: String) -> Self {
        Self { after: Some(path) }
    }

    pub(crate) fn position(&self) -> Option<&str> {
        self.after.as_deref()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.after {
            None => f.write_str("-"),
            Some(path) => f.write_str(&hex::encode(path)),
        }
    }
}

impl FromStr for Cursor {
    type Err = ArborError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "-" {
            return Ok(Self::start());
        }
        if token.is_empty() {
            return Err(ArborError::InvalidCursor("empty token".into()));
        }
        let bytes = hex::decode(token)
            .map_err(|e| ArborError::InvalidCursor(format!("{}: {}", token, e)))?;
        let path = String::from_utf8(bytes)
            .map_err(|_| ArborError::InvalidCursor(format!("{}: not a valid path", token)))?;
        Ok(Self::after(path))
    }
}

/// One page of a `list` scan.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub entries: Vec<EntryView>,
    pub continue_cursor: Cursor,
    pub is_done: bool,
}

/// Result of a single `delete_all` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAllOutcome {
    pub deleted_count: usize,
    /// The subtree still had entries after this batch; a continuation was queued.
    pub has_more: bool,
}

/// Result of a single `vacuum` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VacuumOutcome {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_token_roundtrip_with_separator() {
        let cursor = Cursor::after("users\u{0}42".to_string());
        let token = cursor.to_string();
        assert!(!token.contains('\u{0}'));
        assert_eq!(token.parse::<Cursor>().unwrap(), cursor);
    }

    #[test]
    fn test_start_cursor_token() {
        assert_eq!(Cursor::start().to_string(), "-");
        assert_eq!("-".parse::<Cursor>().unwrap(), Cursor::start());
    }

    #[test]
    fn test_malformed_cursor_rejected() {
        assert!(matches!("abc".parse::<Cursor>(), Err(ArborError::InvalidCursor(_))));
        assert!(matches!("zz".parse::<Cursor>(), Err(ArborError::InvalidCursor(_))));
        assert!(matches!("".parse::<Cursor>(), Err(ArborError::InvalidCursor(_))));
        assert!(matches!("é1".parse::<Cursor>(), Err(ArborError::InvalidCursor(_))));
        // Valid hex, but not UTF-8.
        assert!(matches!("ff".parse::<Cursor>(), Err(ArborError::InvalidCursor(_))));
    }

    #[test]
    fn test_cursor_token_is_lowercase_hex() {
        let token = Cursor::after("ab".to_string()).to_string();
        assert_eq!(token, "6162");
        assert_eq!("6162".parse::<Cursor>().unwrap(), Cursor::after("ab".to_string()));
        assert_eq!("6A".parse::<Cursor>().unwrap(), Cursor::after("j".to_string()));
    }

    #[test]
    fn test_entry_view_omits_value() {
        let entry = Entry {
            key: vec!["a".into()],
            value: b"payload".to_vec(),
            metadata: Some(b"meta".to_vec()),
            updated_at: 7,
            expires_at: None,
        };
        let view = EntryView::from_entry(&entry, false);
        assert_eq!(view.value, None);
        assert_eq!(view.metadata, Some(b"meta".to_vec()));
        assert_eq!(view.updated_at, 7);
    }
}
