//! Synchronous observer lists with detachable subscriptions.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback<E> = Box<dyn FnMut(&E)>;

/// Anything a [`Subscription`] can detach itself from
trait Detach {
    fn detach(&self, id: u64);
}

struct Registry<E> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<E>)>>,
    /// Subscriptions made while a notification was running
    pending_add: RefCell<Vec<(u64, Callback<E>)>>,
    /// Detaches requested while a notification was running
    pending_remove: RefCell<Vec<u64>>,
    notifying: Cell<bool>,
    /// Size of `entries` while they are borrowed for a notification
    notified_len: Cell<usize>,
}

impl<E> Registry<E> {
    fn apply_pending(&self) {
        let added: Vec<_> = self.pending_add.borrow_mut().drain(..).collect();
        let removed: Vec<_> = self.pending_remove.borrow_mut().drain(..).collect();

        let mut entries = self.entries.borrow_mut();
        entries.extend(added);
        entries.retain(|(id, _)| !removed.contains(id));
    }
}

impl<E> Detach for Registry<E> {
    fn detach(&self, id: u64) {
        if self.notifying.get() {
            self.pending_remove.borrow_mut().push(id);
        } else {
            self.entries.borrow_mut().retain(|(entry, _)| *entry != id);
            self.pending_add.borrow_mut().retain(|(entry, _)| *entry != id);
        }
    }
}

/// Ordered list of callbacks invoked synchronously on every event.
///
/// Callbacks may subscribe or unsubscribe while being notified; those
/// changes apply from the next notification on. A callback that notifies
/// the same list again is not re-entered: the nested event is dropped
/// with a warning.
pub struct Observers<E: 'static> {
    registry: Rc<Registry<E>>,
}

impl<E: 'static> Observers<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
                pending_add: RefCell::new(Vec::new()),
                pending_remove: RefCell::new(Vec::new()),
                notifying: Cell::new(false),
                notified_len: Cell::new(0),
            }),
        }
    }

    /// Register a callback; keep the returned handle to detach it later.
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);

        let entry = (id, Box::new(callback) as Callback<E>);
        if self.registry.notifying.get() {
            self.registry.pending_add.borrow_mut().push(entry);
        } else {
            self.registry.entries.borrow_mut().push(entry);
        }

        let registry: Rc<dyn Detach> = self.registry.clone();
        Subscription {
            id,
            registry: Rc::downgrade(&registry),
            active: Cell::new(true),
        }
    }

    pub fn notify(&self, event: &E) {
        if self.registry.notifying.replace(true) {
            tracing::warn!("Nested notification ignored");
            return;
        }
        {
            let mut entries = self.registry.entries.borrow_mut();
            self.registry.notified_len.set(entries.len());
            for (_, callback) in entries.iter_mut() {
                callback(event);
            }
        }
        self.registry.notifying.set(false);
        self.registry.apply_pending();
    }

    /// Callbacks the next notification will reach
    pub fn len(&self) -> usize {
        let registry = &self.registry;
        let current = registry
            .entries
            .try_borrow()
            .map_or(registry.notified_len.get(), |entries| entries.len());
        (current + registry.pending_add.borrow().len())
            .saturating_sub(registry.pending_remove.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Observers::subscribe`].
///
/// Dropping the handle leaves the callback registered; call
/// [`Subscription::unsubscribe`] to detach it.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
    active: Cell<bool>,
}

impl Subscription {
    /// Detach the callback. Calling this again, or after the observed
    /// object is gone, does nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get() && self.registry.strong_count() > 0
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
