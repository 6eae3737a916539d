//! ARBOR - Store Configuration
//! Defines tunable parameters for the hierarchical key-value store.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ArborError, Result};

/// Configuration for the Arbor store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for all data files (write-ahead log).
    pub data_dir: PathBuf,

    /// Whether to sync WAL writes to disk immediately (fsync).
    pub sync_writes: bool,

    /// Maximum number of entries removed by a single `delete_all` invocation.
    pub delete_batch_size: usize,

    /// Maximum number of expired entries removed by a single `vacuum` pass.
    pub vacuum_batch_size: usize,

    /// Maximum number of live entries returned by `get_all`.
    pub get_all_limit: usize,

    /// How often the background vacuum task runs.
    pub vacuum_interval: Duration,

    /// How often the background task drains queued `delete_all` continuations.
    pub continuation_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
            delete_batch_size: 100,
            vacuum_batch_size: 100,
            get_all_limit: 1000,
            vacuum_interval: Duration::from_secs(60),
            continuation_interval: Duration::from_millis(50),
        }
    }
}

impl Config {
    /// Create a new Config with a custom data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Set whether every log append is fsynced.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Set the `delete_all` batch size.
    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size;
        self
    }

    /// Set the `vacuum` batch size.
    pub fn with_vacuum_batch_size(mut self, size: usize) -> Self {
        self.vacuum_batch_size = size;
        self
    }

    /// Set the background vacuum interval.
    pub fn with_vacuum_interval(mut self, interval: Duration) -> Self {
        self.vacuum_interval = interval;
        self
    }

    /// Set the background continuation interval.
    pub fn with_continuation_interval(mut self, interval: Duration) -> Self {
        self.continuation_interval = interval;
        self
    }

    /// Reject settings that would make bulk operations unable to progress.
    pub fn validate(&self) -> Result<()> {
        if self.delete_batch_size == 0 {
            return Err(ArborError::Config("delete_batch_size must be > 0".into()));
        }
        if self.vacuum_batch_size == 0 {
            return Err(ArborError::Config("vacuum_batch_size must be > 0".into()));
        }
        if self.get_all_limit == 0 {
            return Err(ArborError::Config("get_all_limit must be > 0".into()));
        }
        Ok(())
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_batch_contract() {
        let config = Config::default();
        assert_eq!(config.delete_batch_size, 100);
        assert_eq!(config.vacuum_batch_size, 100);
        assert_eq!(config.get_all_limit, 1000);
        assert_eq!(config.vacuum_interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let config = Config::new("/tmp/arbor").with_delete_batch_size(0);
        assert!(matches!(config.validate(), Err(ArborError::Config(_))));

        let config = Config::new("/tmp/arbor").with_vacuum_batch_size(0);
        assert!(matches!(config.validate(), Err(ArborError::Config(_))));
    }
}
