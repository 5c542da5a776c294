//! TTL-cached value slot
//!
//! A `CacheSlot` wraps a synchronous producer function with a time-bounded
//! cache entry persisted through a [`Storage`] backend. Reads prefer a
//! still-valid persisted entry; a missing, stale, or unreadable entry
//! triggers a produce-and-persist cycle. Attaching the slot to a
//! [`VisibilitySignal`] revalidates the entry whenever the application
//! returns to the foreground.
//!
//! Failure semantics are asymmetric on purpose: producer errors become the
//! observable `last_error` state and never escape to the caller, while
//! storage errors are logged and degrade to cache-miss behavior without
//! ever touching `last_error`.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::entry::{storage_key, CacheEntry};
use crate::clock::{Clock, SystemClock};
use crate::storage::Storage;
use crate::visibility::{Subscription, Visibility, VisibilitySignal};

/// Errors raised when constructing a slot
#[derive(Debug, Error)]
pub enum SlotError {
    /// The cache key identifies the persisted entry and must not be empty
    #[error("cache key must not be empty")]
    EmptyKey,
}

/// Configuration for a cache slot
#[derive(Debug, Clone)]
pub struct SlotOptions {
    /// Maximum age at which a persisted entry is still adopted
    pub ttl: Duration,
    /// Whether foreground transitions trigger a revalidation check
    pub auto_refresh: bool,
}

impl Default for SlotOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(300_000), // 5 minutes
            auto_refresh: true,
        }
    }
}

/// Shared slot state, reachable from the handle and from the visibility
/// observer closure.
struct SlotInner<T> {
    key: String,
    options: SlotOptions,
    storage: Rc<dyn Storage>,
    clock: Rc<dyn Clock>,
    producer: Box<dyn FnMut() -> anyhow::Result<T>>,
    value: Option<T>,
    is_loading: bool,
    last_error: Option<anyhow::Error>,
}

impl<T> SlotInner<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Adopts a still-valid persisted entry, or runs a produce cycle.
    fn revalidate(&mut self) {
        if self.adopt_persisted() {
            return;
        }
        self.produce();
    }

    /// Attempts to read and adopt a valid persisted entry.
    ///
    /// Storage-read and deserialization failures are logged and treated as
    /// a miss; they never become `last_error`.
    fn adopt_persisted(&mut self) -> bool {
        let raw = match self.storage.get(&storage_key(&self.key)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                warn!(key = %self.key, error = %err, "cache read failed, treating as miss");
                return false;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key = %self.key, error = %err, "cache entry unreadable, treating as miss");
                return false;
            }
        };

        let ttl_ms = self.options.ttl.as_millis() as i64;
        if !entry.is_valid(self.clock.now_ms(), ttl_ms) {
            return false;
        }

        debug!(key = %self.key, age_ms = entry.age_ms(self.clock.now_ms()), "adopted persisted entry");
        self.value = Some(entry.data);
        self.is_loading = false;
        true
    }

    /// Unconditional produce-and-persist cycle.
    ///
    /// On success the fresh value is persisted stamped with the current
    /// time and any previous error is cleared; on failure the prior value
    /// stays untouched and the error is recorded.
    fn produce(&mut self) {
        self.is_loading = true;

        match (self.producer)() {
            Ok(data) => {
                let entry = CacheEntry {
                    data,
                    timestamp: self.clock.now_ms(),
                };
                self.persist(&entry);
                self.value = Some(entry.data);
                self.last_error = None;
            }
            Err(err) => {
                debug!(key = %self.key, error = %err, "producer failed, keeping previous value");
                self.last_error = Some(err);
            }
        }

        self.is_loading = false;
    }

    /// Writes an entry to storage; failures are logged, never surfaced.
    fn persist(&self, entry: &CacheEntry<T>) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.key, error = %err, "entry not serializable, keeping value in memory only");
                return;
            }
        };
        if let Err(err) = self.storage.set(&storage_key(&self.key), &raw) {
            warn!(key = %self.key, error = %err, "cache write failed, keeping value in memory only");
        }
    }
}

/// A TTL-cached value keyed into a storage backend
///
/// Constructing a slot runs one read/revalidate pass immediately, so
/// `value()` is populated (from cache or a fresh produce) before the
/// constructor returns. Dropping the slot releases its visibility
/// subscription, if any.
///
/// Accessors return `RefCell` guards; release them before calling
/// [`refresh`](CacheSlot::refresh) or emitting on an observed signal.
///
/// The producer runs synchronously on the calling thread. Asynchronous
/// producers are not supported.
pub struct CacheSlot<T> {
    inner: Rc<RefCell<SlotInner<T>>>,
    subscription: Option<Subscription>,
}

impl<T> CacheSlot<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Creates a slot with default options (5 minute TTL, auto-refresh on).
    ///
    /// # Arguments
    /// * `key` - Non-empty identifier for the logical cache slot
    /// * `producer` - Synchronous function producing a fresh value
    /// * `storage` - Backend holding the persisted entry
    pub fn new<P>(
        key: impl Into<String>,
        producer: P,
        storage: Rc<dyn Storage>,
    ) -> Result<Self, SlotError>
    where
        P: FnMut() -> anyhow::Result<T> + 'static,
    {
        Self::with_options(key, producer, storage, SlotOptions::default())
    }

    /// Creates a slot with explicit options and the system clock.
    pub fn with_options<P>(
        key: impl Into<String>,
        producer: P,
        storage: Rc<dyn Storage>,
        options: SlotOptions,
    ) -> Result<Self, SlotError>
    where
        P: FnMut() -> anyhow::Result<T> + 'static,
    {
        Self::with_clock(key, producer, storage, options, Rc::new(SystemClock))
    }

    /// Creates a slot with an explicit clock.
    ///
    /// The injected clock is what makes TTL boundaries exactly testable;
    /// applications use [`SystemClock`] via the other constructors.
    pub fn with_clock<P>(
        key: impl Into<String>,
        producer: P,
        storage: Rc<dyn Storage>,
        options: SlotOptions,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, SlotError>
    where
        P: FnMut() -> anyhow::Result<T> + 'static,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(SlotError::EmptyKey);
        }

        let inner = Rc::new(RefCell::new(SlotInner {
            key,
            options,
            storage,
            clock,
            producer: Box::new(producer),
            value: None,
            is_loading: false,
            last_error: None,
        }));

        // Initial read: adopt a valid persisted entry or produce one.
        inner.borrow_mut().revalidate();

        Ok(Self {
            inner,
            subscription: None,
        })
    }

    /// Registers the slot on a visibility signal.
    ///
    /// On every transition to [`Visibility::Foreground`] the slot re-checks
    /// its persisted entry: a still-valid entry is adopted without running
    /// the producer, anything else triggers a produce cycle. Replaces any
    /// previous registration; a no-op when `auto_refresh` is disabled.
    pub fn observe(&mut self, signal: &VisibilitySignal) {
        if !self.inner.borrow().options.auto_refresh {
            self.subscription = None;
            return;
        }

        let weak: Weak<RefCell<SlotInner<T>>> = Rc::downgrade(&self.inner);
        self.subscription = Some(signal.subscribe(move |visibility| {
            if visibility != Visibility::Foreground {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().revalidate();
            }
        }));
    }

    /// Current best-known value; `None` only before the first successful
    /// read.
    pub fn value(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.inner.borrow(), |inner| inner.value.as_ref()).ok()
    }

    /// True while a produce-and-persist cycle is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.borrow().is_loading
    }

    /// Error from the most recent failed produce cycle, cleared on the
    /// next success. Storage failures never appear here.
    pub fn last_error(&self) -> Option<Ref<'_, anyhow::Error>> {
        Ref::filter_map(self.inner.borrow(), |inner| inner.last_error.as_ref()).ok()
    }

    /// Unconditionally runs the producer and persists the result.
    ///
    /// On producer failure the previous value is left untouched and the
    /// error is recorded as [`last_error`](CacheSlot::last_error).
    pub fn refresh(&self) {
        self.inner.borrow_mut().produce();
    }
}
