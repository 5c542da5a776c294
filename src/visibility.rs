//! Application visibility signal source
//!
//! Models foreground/background transitions as an in-process subscribe/emit
//! hub. The host shell owns a `VisibilitySignal` and emits transitions into
//! it; cache slots subscribe so a return to the foreground can revalidate
//! stale entries without polling. Subscriptions are scoped: dropping the
//! `Subscription` guard deregisters the observer, so a torn-down slot never
//! leaves a callback behind.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

/// Foreground/background state of the hosting application window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The application is visible to the user
    Foreground,
    /// The application is hidden or minimized
    Background,
}

type Observer = Box<dyn FnMut(Visibility)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
    /// Ids dropped while the observer list was checked out by `emit`.
    retired: Vec<u64>,
}

/// In-process broadcast hub for visibility transitions
///
/// Clones share the same observer registry. Single-threaded: delivery
/// happens synchronously on the emitting thread, in subscription order.
#[derive(Clone, Default)]
pub struct VisibilitySignal {
    registry: Rc<RefCell<Registry>>,
}

impl VisibilitySignal {
    /// Creates a signal with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for every subsequent transition.
    ///
    /// The observer stays registered until the returned `Subscription` is
    /// dropped.
    pub fn subscribe(&self, observer: impl FnMut(Visibility) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Box::new(observer)));
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Delivers a transition to every live observer.
    pub fn emit(&self, visibility: Visibility) {
        debug!(?visibility, "visibility transition");

        // Check the list out of the registry so observers may subscribe or
        // drop subscriptions while being notified.
        let mut observers = std::mem::take(&mut self.registry.borrow_mut().observers);
        for (_, observer) in observers.iter_mut() {
            observer(visibility);
        }

        let mut registry = self.registry.borrow_mut();
        let retired = std::mem::take(&mut registry.retired);
        observers.retain(|(id, _)| !retired.contains(id));
        // Anything subscribed during delivery goes after the survivors.
        observers.append(&mut registry.observers);
        registry.observers = observers;
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.registry.borrow().observers.len()
    }
}

/// Guard for a registered observer; deregisters on drop.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        if let Some(pos) = registry.observers.iter().position(|(id, _)| *id == self.id) {
            registry.observers.remove(pos);
        } else {
            // The list is checked out by an in-flight emit; flag the id so
            // the merge drops it.
            registry.retired.push(self.id);
        }
    }
}
