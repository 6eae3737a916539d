//! ARBOR - Hierarchical Key Codec
//! Maps segmented keys onto a single sortable string and computes the
//! half-open range covering a prefix subtree.
//!
//! ## Encoding
//! ```text
//! ["users", "1", "profile"]  ->  "users\0" "1\0" "profile"   (joined with SEPARATOR)
//! ```
//! `SEPARATOR` (0x00) sorts below every byte a segment may contain, so the
//! order of encoded paths matches segment-by-segment key order.
//!
//! ## Prefix range
//! For prefix `P` the subtree is `[encode(P), encode(P) + SENTINEL)`.
//! `SENTINEL` (0x01) sits strictly between the separator and any byte that can
//! follow `encode(P)` in a sibling such as `["aa"]`, so `["a"]` covers `"a"` and
//! `"a\0b"` but never `"aa"`.

use std::ops::Bound;

use crate::error::{ArborError, Result};

/// Reserved byte joining segments. Segments must not contain it.
pub const SEPARATOR: char = '\u{0}';

/// Exclusive upper-bound marker appended to a prefix path.
pub const SENTINEL: char = '\u{1}';

/// Validate a single segment.
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(ArborError::InvalidKey("empty segment".into()));
    }
    if segment.contains(SEPARATOR) {
        return Err(ArborError::InvalidKey(format!(
            "segment {:?} contains the reserved separator",
            segment
        )));
    }
    Ok(())
}

fn join<S: AsRef<str>>(segments: &[S]) -> Result<String> {
    let mut path = String::with_capacity(segments.iter().map(|s| s.as_ref().len() + 1).sum());
    for (i, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        check_segment(segment)?;
        if i > 0 {
            path.push(SEPARATOR);
        }
        path.push_str(segment);
    }
    Ok(path)
}

/// Encode a point key. The key must have at least one segment.
pub fn encode<S: AsRef<str>>(key: &[S]) -> Result<String> {
    if key.is_empty() {
        return Err(ArborError::InvalidKey("key has no segments".into()));
    }
    join(key)
}

/// Half-open range of encoded paths belonging to a prefix subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRange {
    lower: String,
    /// `None` for the empty prefix, which is unbounded.
    upper: Option<String>,
}

impl PathRange {
    /// Range covering every path.
    pub fn full() -> Self {
        Self {
            lower: String::new(),
            upper: None,
        }
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn upper(&self) -> Option<&str> {
        self.upper.as_deref()
    }

    /// Whether `path` falls inside the range.
    pub fn contains(&self, path: &str) -> bool {
        path >= self.lower.as_str() && self.upper.as_deref().map_or(true, |upper| path < upper)
    }

    /// Bounds for a scan resuming strictly after `after`.
    ///
    /// Returns `None` when the resume point lies at or beyond the upper bound,
    /// so there is nothing left to scan.
    pub fn bounds_after<'a>(&'a self, after: Option<&'a str>) -> Option<(Bound<&'a str>, Bound<&'a str>)> {
        let start = match after {
            Some(after) if after >= self.lower.as_str() => {
                if let Some(upper) = self.upper.as_deref() {
                    if after >= upper {
                        return None;
                    }
                }
                Bound::Excluded(after)
            }
            _ => Bound::Included(self.lower.as_str()),
        };
        let end = match self.upper.as_deref() {
            Some(upper) => Bound::Excluded(upper),
            None => Bound::Unbounded,
        };
        Some((start, end))
    }
}

/// Compute the range of a prefix subtree. The empty prefix is the full range.
pub fn prefix_range<S: AsRef<str>>(prefix: &[S]) -> Result<PathRange> {
    if prefix.is_empty() {
        return Ok(PathRange::full());
    }
    let lower = join(prefix)?;
    let mut upper = lower.clone();
    upper.push(SENTINEL);
    Ok(PathRange {
        lower,
        upper: Some(upper),
    })
}
