//! Freshslot — TTL-cached value slots
//!
//! Wraps a caller-supplied synchronous producer with a time-bounded cache
//! entry persisted in a pluggable key-value store, revalidated when the
//! hosting application returns to the foreground.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod storage;
pub mod visibility;
