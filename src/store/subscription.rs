//! Observer bookkeeping for [`Store`](super::Store).
//!
//! Observers live in a registry shared between the store and every
//! [`Subscription`] handed out. Notification iterates over a snapshot of the
//! registry taken when the cycle starts, so callbacks are free to subscribe
//! or unsubscribe while being notified.
//!
//! # Invariants
//!
//! 1. Observers are notified in registration order.
//! 2. An observer registered during a cycle is first notified in the next one.
//! 3. An observer removed during a cycle is not notified again, including
//!    later in the same cycle.
//! 4. A panicking observer does not prevent the remaining ones from running.
//! 5. A cycle superseded by a nested dispatch ends early, so no observer
//!    receives a state older than the one it last saw.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

type Callback<S> = Box<dyn Fn(&S, &S)>;

struct ObserverEntry<S> {
    id: u64,
    active: Cell<bool>,
    callback: Callback<S>,
}

pub(crate) struct ObserverRegistry<S> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Rc<ObserverEntry<S>>>>,
}

impl<S: 'static> ObserverRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register a callback receiving `(next, previous)`.
    pub(crate) fn register(self: &Rc<Self>, callback: impl Fn(&S, &S) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        self.entries.borrow_mut().push(Rc::new(ObserverEntry {
            id,
            active: Cell::new(true),
            callback: Box::new(callback),
        }));

        let registry: Weak<dyn Unsubscribe> = Rc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription { id, registry }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Invoke every observer registered when the cycle starts.
    ///
    /// The cycle stops as soon as `is_current` turns false, i.e. when an
    /// observer dispatched again and a newer cycle already delivered a later
    /// state to everyone.
    pub(crate) fn notify(&self, next: &S, previous: &S, is_current: impl Fn() -> bool) {
        let snapshot: Vec<Rc<ObserverEntry<S>>> = self.entries.borrow().clone();

        for entry in snapshot {
            if !is_current() {
                break;
            }
            if !entry.active.get() {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(next, previous)));
            if outcome.is_err() {
                tracing::warn!(observer = entry.id, "Observer panicked; continuing notification");
            }
        }
    }
}

/// Type-erased removal so [`Subscription`] does not carry the state type.
trait Unsubscribe {
    fn remove(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<S> Unsubscribe for ObserverRegistry<S> {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = entries.remove(position);
        entry.active.set(false);
        true
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }
}

/// Capability to remove one observer from its store.
///
/// Dropping a `Subscription` does **not** unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). Clones refer to the same observer.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Remove the observer. Returns `false` if it was already removed or the
    /// store is gone.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }

    /// Whether the observer is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
