//! TTL-cached value slots persisted through a key-value store
//!
//! This module provides the cache core: the persisted entry format with its
//! freshness invariant, and the `CacheSlot` wrapper that keeps a consumer
//! supplied with the most recent valid value for a key, producing a fresh
//! one when the entry is absent or stale. Entries survive the slot that
//! wrote them, so a later instantiation with the same key adopts the
//! persisted value instead of re-producing it.

mod entry;
mod slot;

pub use entry::{storage_key, CacheEntry, STORAGE_KEY_PREFIX};
pub use slot::{CacheSlot, SlotError, SlotOptions};
