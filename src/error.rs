//! ARBOR - Custom Error Types
//! Defines the error hierarchy for the hierarchical key-value store.
//!
//! A missing key is not an error: lookups report absence as `None` / `false`.

use thiserror::Error;

/// Custom Result type for the Arbor store.
pub type Result<T> = std::result::Result<T, ArborError>;

/// Error types for the Arbor store.
#[derive(Error, Debug)]
pub enum ArborError {
    /// I/O errors from file operations (write-ahead log).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (CRC mismatch).
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// WAL recovery failure.
    #[error("WAL recovery failed: {0}")]
    RecoveryFailed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key or prefix violates the segment contract
    /// (empty segment, or a segment containing the reserved separator).
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Pagination cursor could not be decoded.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// A thread panicked while holding the store lock.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl From<bincode::Error> for ArborError {
    fn from(err: bincode::Error) -> Self {
        ArborError::Serialization(err.to_string())
    }
}
