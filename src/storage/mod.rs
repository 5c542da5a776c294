//! Key-value storage backends for persisted cache entries
//!
//! The store is an injected dependency rather than a hidden global, so it
//! can be faked in tests and swapped between an in-memory map and a
//! file-per-key directory. Both operations are synchronous and fallible;
//! the cache layer above swallows every storage error and degrades to
//! cache-miss behavior.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by a storage backend
///
/// None of these are fatal to a cache slot: reads that fail degrade to a
/// miss, writes that fail leave the freshly produced value in memory only.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (missing directory, permissions, disk full)
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the write (e.g. quota exceeded)
    #[error("storage rejected write for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },

    /// The backend is not usable at all
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value store holding persisted cache entries.
///
/// Keys and values are plain strings; the cache layer owns the JSON entry
/// encoding. Implementations take `&self` and manage their own interior
/// mutability, since slots share a backend through `Rc<dyn Storage>`.
pub trait Storage {
    /// Retrieves the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key exists
    /// * `Ok(None)` if the key has never been written
    /// * `Err(StorageError)` if the backend could not be consulted
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
