//! ARBOR - Range Scanner
//! Paginated and single-shot listing over a prefix subtree.
//!
//! Scans are non-destructive: expired entries are skipped but left in
//! place for `delete`, `delete_all` or `vacuum` to reclaim.

use crate::types::{Cursor, EntryView, ListPage, Timestamp};

use super::keycodec::PathRange;
use super::table::EntryTable;
use super::ttl;

/// Produce one page of at most `limit` live entries after `cursor`.
///
/// Expired entries are skipped without counting toward `limit`. The returned
/// cursor points at the last path examined, so the next page never repeats
/// an entry. `is_done` is set once nothing (live or expired) remains in the
/// range beyond that cursor.
pub fn list_page(
    table: &EntryTable,
    range: &PathRange,
    cursor: Option<&Cursor>,
    limit: usize,
    include_values: bool,
    now: Timestamp,
) -> ListPage {
    let limit = limit.max(1);
    let after = cursor.and_then(Cursor::position);

    let mut entries = Vec::with_capacity(limit.min(128));
    let mut last_examined: Option<&str> = None;
    let mut iter = table.range(range, after).peekable();

    while entries.len() < limit {
        let Some((path, entry)) = iter.next() else {
            break;
        };
        last_examined = Some(path.as_str());
        if ttl::is_live(entry.expires_at, now) {
            entries.push(EntryView::from_entry(entry, include_values));
        }
    }
    let is_done = iter.peek().is_none();

    let continue_cursor = match last_examined {
        Some(path) => Cursor::after(path.to_string()),
        None => cursor.cloned().unwrap_or_default(),
    };

    ListPage {
        entries,
        continue_cursor,
        is_done,
    }
}

/// Collect up to `cap` live entries of the whole range in one call.
pub fn collect_live(
    table: &EntryTable,
    range: &PathRange,
    cap: usize,
    include_values: bool,
    now: Timestamp,
) -> Vec<EntryView> {
    table
        .range(range, None)
        .filter(|(_, entry)| ttl::is_live(entry.expires_at, now))
        .take(cap)
        .map(|(_, entry)| EntryView::from_entry(entry, include_values))
        .collect()
}
