//! End-to-end cache slot lifecycle tests
//!
//! Exercises the full read/produce/persist/revalidate cycle across slot
//! instances sharing one store, including the visibility-driven path.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use freshslot::cache::{CacheEntry, CacheSlot, SlotOptions};
use freshslot::clock::{Clock, ManualClock};
use freshslot::storage::{FileStore, MemoryStore, Storage};
use freshslot::visibility::{Visibility, VisibilitySignal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Fees {
    rate: u32,
}

fn options(ttl_ms: u64) -> SlotOptions {
    SlotOptions {
        ttl: Duration::from_millis(ttl_ms),
        auto_refresh: true,
    }
}

fn fees_producer(
    calls: &Rc<Cell<u32>>,
    rate: u32,
) -> impl FnMut() -> anyhow::Result<Fees> + 'static {
    let calls = Rc::clone(calls);
    move || {
        calls.set(calls.get() + 1);
        Ok(Fees { rate })
    }
}

/// The lifecycle scenario: produce at t=0, adopt at t=500, re-produce at
/// t=1200 once the entry has gone stale.
#[test]
fn test_fees_scenario_across_instances() {
    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(ManualClock::new(0));

    // t=0: empty store, first slot produces and persists {rate:5}.
    let first_calls = Rc::new(Cell::new(0));
    let first = CacheSlot::with_clock(
        "fees",
        fees_producer(&first_calls, 5),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    assert_eq!(first_calls.get(), 1);
    assert_eq!(*first.value().expect("value produced"), Fees { rate: 5 });

    let raw = store.get("cache_fees").unwrap().expect("entry persisted");
    let entry: CacheEntry<Fees> = serde_json::from_str(&raw).expect("entry parses");
    assert_eq!(entry.timestamp, 0, "persisted timestamp is the produce time");

    // t=500: a new instance adopts the cached value immediately.
    clock.set(500);
    let second_calls = Rc::new(Cell::new(0));
    let second = CacheSlot::with_clock(
        "fees",
        fees_producer(&second_calls, 99),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    assert_eq!(second_calls.get(), 0, "producer not invoked on a valid entry");
    assert_eq!(*second.value().expect("value adopted"), Fees { rate: 5 });

    // t=1200: the entry is stale, a new instance produces a fresh value.
    clock.set(1_200);
    let third_calls = Rc::new(Cell::new(0));
    let third = CacheSlot::with_clock(
        "fees",
        fees_producer(&third_calls, 7),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    assert_eq!(third_calls.get(), 1, "stale entry triggers a produce");
    assert_eq!(*third.value().expect("value refreshed"), Fees { rate: 7 });
}

/// A slot returning to the foreground adopts an entry persisted by a
/// sibling instance instead of re-producing.
#[test]
fn test_foreground_adopts_fresher_sibling_entry() {
    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(ManualClock::new(0));
    let signal = VisibilitySignal::new();

    let calls_a = Rc::new(Cell::new(0));
    let mut slot_a = CacheSlot::with_clock(
        "fees",
        fees_producer(&calls_a, 5),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");
    slot_a.observe(&signal);

    // A sibling refreshes at t=800, writing a fresher entry.
    clock.set(800);
    let calls_b = Rc::new(Cell::new(0));
    let slot_b = CacheSlot::with_clock(
        "fees",
        fees_producer(&calls_b, 6),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");
    slot_b.refresh();
    assert_eq!(*slot_b.value().unwrap(), Fees { rate: 6 });

    // t=1500: slot A's own produce (t=0) would be stale, but the sibling's
    // write (t=800) is still valid; foreground adopts it.
    clock.set(1_500);
    signal.emit(Visibility::Foreground);
    assert_eq!(calls_a.get(), 1, "no re-produce when a valid entry exists");
    assert_eq!(*slot_a.value().unwrap(), Fees { rate: 6 }, "last write wins");
}

#[test]
fn test_persisted_entry_survives_into_file_store() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let clock = Rc::new(ManualClock::new(0));

    {
        let store = Rc::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
        let calls = Rc::new(Cell::new(0));
        let _slot = CacheSlot::with_clock(
            "fees",
            fees_producer(&calls, 5),
            Rc::clone(&store) as Rc<dyn Storage>,
            options(10_000),
            Rc::clone(&clock) as Rc<dyn Clock>,
        )
        .expect("Slot construction should succeed");
        assert_eq!(calls.get(), 1);
    }

    // A fresh store over the same directory: the reloaded slot adopts the
    // entry the previous one persisted.
    clock.set(5_000);
    let store = Rc::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
    let calls = Rc::new(Cell::new(0));
    let slot = CacheSlot::with_clock(
        "fees",
        fees_producer(&calls, 99),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(10_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    assert_eq!(calls.get(), 0, "entry outlives the slot that wrote it");
    assert_eq!(*slot.value().unwrap(), Fees { rate: 5 });
}

#[test]
fn test_slots_with_different_keys_are_isolated() {
    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(ManualClock::new(0));

    let fees_calls = Rc::new(Cell::new(0));
    let fees = CacheSlot::with_clock(
        "fees",
        fees_producer(&fees_calls, 5),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    let limits_calls = Rc::new(Cell::new(0));
    let limits = CacheSlot::with_clock(
        "limits",
        fees_producer(&limits_calls, 50),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");

    fees.refresh();
    limits.refresh();

    assert_eq!(*fees.value().unwrap(), Fees { rate: 5 });
    assert_eq!(*limits.value().unwrap(), Fees { rate: 50 });

    // Reload both keys through fresh instances; neither sees the other's
    // entry.
    let reload_fees_calls = Rc::new(Cell::new(0));
    let reload_fees = CacheSlot::with_clock(
        "fees",
        fees_producer(&reload_fees_calls, 1),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");
    assert_eq!(reload_fees_calls.get(), 0);
    assert_eq!(*reload_fees.value().unwrap(), Fees { rate: 5 });
}

#[test]
fn test_torn_down_slot_stops_observing() {
    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(ManualClock::new(0));
    let signal = VisibilitySignal::new();

    let calls = Rc::new(Cell::new(0));
    let mut slot = CacheSlot::with_clock(
        "fees",
        fees_producer(&calls, 5),
        Rc::clone(&store) as Rc<dyn Storage>,
        options(1_000),
        Rc::clone(&clock) as Rc<dyn Clock>,
    )
    .expect("Slot construction should succeed");
    slot.observe(&signal);

    drop(slot);

    clock.set(10_000);
    signal.emit(Visibility::Foreground);
    assert_eq!(calls.get(), 1, "no revalidation after teardown");
    assert_eq!(signal.observer_count(), 0);
}
