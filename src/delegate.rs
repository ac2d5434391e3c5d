//! Multicast observer used for model lifecycle notifications.
//!
//! The chart core is single-threaded by contract, so listener lists live
//! behind `Rc<RefCell<…>>` and handles are cheaply cloneable.

use std::cell::RefCell;
use std::rc::Rc;

pub type SubscriptionId = u64;

/// Opaque key tying a group of subscriptions to one owner, so they can be
/// dropped together with `unsubscribe_all`.
pub type LinkedObject = usize;

type Callback<T> = Rc<dyn Fn(&T)>;

struct Listener<T> {
    id: SubscriptionId,
    callback: Callback<T>,
    linked_object: Option<LinkedObject>,
    singleshot: bool,
}

struct DelegateState<T> {
    listeners: Vec<Listener<T>>,
    next_id: SubscriptionId,
}

/// Fan-out dispatcher with single-shot and linked-object unsubscribe.
///
/// `fire` dispatches to a snapshot of the listener list: subscriptions and
/// unsubscriptions performed by a callback affect future fires, never the
/// one in flight.
pub struct Delegate<T> {
    inner: Rc<RefCell<DelegateState<T>>>,
}

impl<T> Clone for Delegate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Delegate<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Delegate")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

impl<T> Default for Delegate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Delegate<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DelegateState {
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        self.subscribe_with(callback, None, false)
    }

    pub fn subscribe_with(
        &self,
        callback: impl Fn(&T) + 'static,
        linked_object: Option<LinkedObject>,
        singleshot: bool,
    ) -> SubscriptionId {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push(Listener {
            id,
            callback: Rc::new(callback),
            linked_object,
            singleshot,
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|listener| listener.id != id);
    }

    /// Removes every listener registered with the given linked object.
    pub fn unsubscribe_all(&self, linked_object: LinkedObject) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|listener| listener.linked_object != Some(linked_object));
    }

    pub fn fire(&self, value: &T) {
        // Single-shots leave the live list before any callback runs, so a
        // re-entrant fire cannot deliver them twice.
        let snapshot: Vec<Callback<T>> = {
            let mut state = self.inner.borrow_mut();
            let snapshot = state
                .listeners
                .iter()
                .map(|listener| Rc::clone(&listener.callback))
                .collect();
            state.listeners.retain(|listener| !listener.singleshot);
            snapshot
        };
        for callback in snapshot {
            callback(value);
        }
    }

    #[must_use]
    pub fn has_listeners(&self) -> bool {
        !self.inner.borrow().listeners.is_empty()
    }

    pub fn destroy(&self) {
        self.inner.borrow_mut().listeners.clear();
    }
}
