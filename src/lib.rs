//! ARBOR - Hierarchical Key-Value Store
//!
//! A key-value store over a single ordered table where keys are paths of
//! string segments (`["users", "1", "profile"]`).
//!
//! ## Features
//! - **Hierarchical keys**: segment-ordered encoding with collision-free prefix ranges
//! - **Prefix scans**: paginated `list` with opaque cursors, single-shot `get_all`
//! - **TTL**: per-entry expiration, hidden on read, reclaimed by `vacuum`
//! - **Bulk deletion**: `delete_all` works in bounded batches with queued continuations
//! - **Write-Ahead Log**: crash recovery with CRC32 integrity checks
//! - **Maintenance**: background threads for vacuum and continuations
//! - **Scoped stores**: mount a view at a fixed prefix
//!
//! ## Example
//! ```no_run
//! use arbor::{config::Config, engine::Arbor, types::{ListOptions, SetOptions}};
//!
//! let mut store = Arbor::open(Config::default()).unwrap();
//!
//! store.set(&["users", "1", "profile"], b"alice".to_vec(), SetOptions::new()).unwrap();
//! store.set(&["users", "1", "session"], b"s1".to_vec(), SetOptions::new().with_ttl(60_000)).unwrap();
//!
//! let page = store.list(&["users", "1"], &ListOptions::default()).unwrap();
//! assert_eq!(page.entries.len(), 2);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod scoped;
pub mod types;
