//! Persisted cache entry format and storage key derivation
//!
//! A `CacheEntry` is the single record written to the key-value store per
//! logical cache slot: the opaque payload plus the wall-clock time at which
//! it was produced. Validity is judged lazily against a TTL at read time;
//! nothing is baked into the entry besides the production timestamp, so one
//! persisted entry can be judged under any TTL.

use serde::{Deserialize, Serialize};

/// Prefix applied to every caller-supplied key before it reaches the store.
///
/// Keeps multiple logical caches from colliding with other users of the
/// same storage namespace.
pub const STORAGE_KEY_PREFIX: &str = "cache_";

/// Derives the storage key for a caller-supplied cache key.
///
/// The derivation is deterministic: the same caller key always maps to the
/// same storage key, and distinct caller keys never collide.
pub fn storage_key(key: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, key)
}

/// Wrapper record persisted to the key-value store, one per cache slot
///
/// Serialized as `{"data": <payload>, "timestamp": <integer ms epoch>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload, opaque to the cache layer
    pub data: T,
    /// When the payload was produced, in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    /// Returns whether the entry is still valid under the given TTL.
    ///
    /// An entry produced at time T is valid strictly before T + ttl: it is
    /// valid at T + ttl − 1 and invalid at T + ttl.
    pub fn is_valid(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.timestamp < ttl_ms
    }

    /// Age of the entry at the given instant, in milliseconds.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }
}
