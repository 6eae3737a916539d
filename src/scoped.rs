//! ARBOR - Prefix-Scoped Store
//! A view of the store mounted at a fixed key prefix. Every operation
//! prepends the scope's prefix to the caller's relative key before
//! delegating, so a scope behaves like a table or collection.
//!
//! ```no_run
//! use arbor::config::Config;
//! use arbor::engine::concurrent::ConcurrentArbor;
//! use arbor::scoped::ScopedStore;
//! use arbor::types::SetOptions;
//!
//! let store = ConcurrentArbor::open(Config::default()).unwrap();
//! let users = ScopedStore::new(store, &["users"]);
//! users.set(&["123"], b"alice".to_vec(), SetOptions::new()).unwrap(); // writes ["users", "123"]
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::concurrent::ConcurrentArbor;
use crate::error::Result;
use crate::types::{
    DeleteAllOutcome, Entry, EntryView, Key, ListOptions, ListPage, SetOptions, Value,
};

#[derive(Clone)]
pub struct ScopedStore {
    store: ConcurrentArbor,
    prefix: Key,
    /// Applied to `set` calls that carry no metadata of their own.
    default_metadata: Option<Value>,
}

impl ScopedStore {
    pub fn new<S: AsRef<str>>(store: ConcurrentArbor, prefix: &[S]) -> Self {
        Self {
            store,
            prefix: prefix.iter().map(|s| s.as_ref().to_string()).collect(),
            default_metadata: None,
        }
    }

    /// Nested scope at `self.prefix + sub`. Inherits the default metadata.
    pub fn with_prefix<S: AsRef<str>>(&self, sub: &[S]) -> Self {
        Self {
            store: self.store.clone(),
            prefix: self.full_key(sub),
            default_metadata: self.default_metadata.clone(),
        }
    }

    pub fn with_default_metadata(mut self, metadata: Value) -> Self {
        self.default_metadata = Some(metadata);
        self
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    fn full_key<S: AsRef<str>>(&self, relative: &[S]) -> Key {
        self.prefix
            .iter()
            .cloned()
            .chain(relative.iter().map(|s| s.as_ref().to_string()))
            .collect()
    }

    pub fn get<S: AsRef<str>>(&self, key: &[S]) -> Result<Option<Entry>> {
        self.store.get(&self.full_key(key))
    }

    /// Just the value of a live entry.
    pub fn get_value<S: AsRef<str>>(&self, key: &[S]) -> Result<Option<Value>> {
        Ok(self.get(key)?.map(|entry| entry.value))
    }

    pub fn has<S: AsRef<str>>(&self, key: &[S]) -> Result<bool> {
        self.store.has(&self.full_key(key))
    }

    pub fn set<S: AsRef<str>>(&self, key: &[S], value: Value, mut options: SetOptions) -> Result<()> {
        if options.metadata.is_none() {
            options.metadata = self.default_metadata.clone();
        }
        self.store.set(&self.full_key(key), value, options)
    }

    pub fn delete<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.store.delete(&self.full_key(key))
    }

    /// Entries in the page carry full (unscoped) keys.
    pub fn list<S: AsRef<str>>(&self, prefix: &[S], options: &ListOptions) -> Result<ListPage> {
        self.store.list(&self.full_key(prefix), options)
    }

    pub fn get_all<S: AsRef<str>>(&self, prefix: &[S], include_values: bool) -> Result<Vec<EntryView>> {
        self.store.get_all(&self.full_key(prefix), include_values)
    }

    pub fn delete_all<S: AsRef<str>>(&self, prefix: &[S]) -> Result<DeleteAllOutcome> {
        self.store.delete_all(&self.full_key(prefix))
    }

    /// Store a serde value, encoded with bincode.
    pub fn set_typed<S: AsRef<str>, T: Serialize>(
        &self,
        key: &[S],
        value: &T,
        options: SetOptions,
    ) -> Result<()> {
        self.set(key, bincode::serialize(value)?, options)
    }

    /// Load a value written by `set_typed`.
    pub fn get_typed<S: AsRef<str>, T: DeserializeOwned>(&self, key: &[S]) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde::Deserialize;

    fn temp_store() -> (tempfile::TempDir, ConcurrentArbor) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConcurrentArbor::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        (dir, store)
    }

    #[test]
    fn test_scope_prepends_prefix() {
        let (_dir, store) = temp_store();
        let users = ScopedStore::new(store.clone(), &["users"]);
        users.set(&["123"], b"alice".to_vec(), SetOptions::new()).unwrap();

        assert_eq!(store.get(&["users", "123"]).unwrap().unwrap().value, b"alice");
        assert_eq!(users.get_value(&["123"]).unwrap(), Some(b"alice".to_vec()));
        assert!(!users.has(&["users", "123"]).unwrap());
    }

    #[test]
    fn test_nested_scope() {
        let (_dir, store) = temp_store();
        let sessions = ScopedStore::new(store.clone(), &["users"]).with_prefix(&["1", "sessions"]);
        assert_eq!(sessions.prefix(), ["users", "1", "sessions"]);

        sessions.set(&["101"], vec![1], SetOptions::new()).unwrap();
        assert!(store.has(&["users", "1", "sessions", "101"]).unwrap());

        let all = sessions.get_all::<&str>(&[], true).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, vec!["users", "1", "sessions", "101"]);
    }

    #[test]
    fn test_scoped_delete_all_stays_in_scope() {
        let (_dir, store) = temp_store();
        let a = ScopedStore::new(store.clone(), &["a"]);
        a.set(&["x"], vec![1], SetOptions::new()).unwrap();
        store.set(&["aa", "x"], vec![1], SetOptions::new()).unwrap();

        let outcome = a.delete_all::<&str>(&[]).unwrap();
        assert_eq!(outcome.deleted_count, 1);
        assert!(store.has(&["aa", "x"]).unwrap());
    }

    #[test]
    fn test_default_metadata() {
        let (_dir, store) = temp_store();
        let scoped = ScopedStore::new(store, &["cfg"]).with_default_metadata(b"schema-v1".to_vec());
        scoped.set(&["a"], vec![1], SetOptions::new()).unwrap();
        scoped
            .set(&["b"], vec![1], SetOptions::new().with_metadata(b"own".to_vec()))
            .unwrap();

        assert_eq!(scoped.get(&["a"]).unwrap().unwrap().metadata, Some(b"schema-v1".to_vec()));
        assert_eq!(scoped.get(&["b"]).unwrap().unwrap().metadata, Some(b"own".to_vec()));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        active: bool,
    }

    #[test]
    fn test_typed_values() {
        let (_dir, store) = temp_store();
        let profiles = ScopedStore::new(store, &["profiles"]);
        let alice = Profile {
            name: "Alice".into(),
            active: true,
        };
        profiles.set_typed(&["1"], &alice, SetOptions::new()).unwrap();
        assert_eq!(profiles.get_typed::<_, Profile>(&["1"]).unwrap(), Some(alice));
        assert_eq!(profiles.get_typed::<_, Profile>(&["2"]).unwrap(), None);
    }
}
