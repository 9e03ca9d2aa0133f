// ============================================================================
// spark-entities - Type Definitions
// Type-erased node interface and listener registry for the reactive layer
// ============================================================================
//
// Cells and selectors form a small notification graph:
//
//   StateCell<S> --> Selector<A> --> Selector<B>
//                \-> Selector<C>
//
// Every node can be read, carries a version that moves when its value
// changes, and keeps a list of listeners. Selectors talk to their source only
// through `AnyReadable<T>`, so a selector does not care whether it sits on a
// cell or on another selector.
// =============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Equality used to decide whether a node's value changed.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Zero-argument callback run when a node changes.
pub type Listener = Rc<dyn Fn()>;

// =============================================================================
// ANY READABLE
// =============================================================================

/// Read side of a reactive node.
pub trait AnyReadable<T> {
    /// Current version. Lazily refreshes derived nodes first, so the version
    /// and the value seen by `peek` always agree.
    fn version(&self) -> u64;

    /// Run `f` on the current value. Returns false if there is none yet.
    fn peek(&self, f: &mut dyn FnMut(&T)) -> bool;

    /// Register a listener; it stays registered while the token lives.
    fn listen(&self, listener: Listener) -> crate::primitives::subscription::Subscription;
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Registry of listeners keyed by a per-registry id.
#[derive(Default)]
pub struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Listener)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its id
    pub fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        id
    }

    /// Remove a listener by id, returning whether it was registered
    pub fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Call every listener registered at the time of the call.
    ///
    /// The list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in snapshot {
            listener();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_add_remove_notify() {
        let hits = Rc::new(Cell::new(0));
        let listeners = Listeners::new();

        let a = listeners.add({
            let hits = hits.clone();
            Rc::new(move || hits.set(hits.get() + 1))
        });
        listeners.add({
            let hits = hits.clone();
            Rc::new(move || hits.set(hits.get() + 10))
        });
        assert_eq!(listeners.len(), 2);

        listeners.notify();
        assert_eq!(hits.get(), 11);

        assert!(listeners.remove(a));
        assert!(!listeners.remove(a));
        listeners.notify();
        assert_eq!(hits.get(), 21);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let listeners = Rc::new(Listeners::new());
        let hits = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(0));

        let id = listeners.add({
            let listeners = Rc::downgrade(&listeners);
            let hits = hits.clone();
            let own_id = own_id.clone();
            Rc::new(move || {
                hits.set(hits.get() + 1);
                if let Some(listeners) = listeners.upgrade() {
                    listeners.remove(own_id.get());
                }
            })
        });
        own_id.set(id);

        listeners.notify();
        listeners.notify();
        assert_eq!(hits.get(), 1);
        assert!(listeners.is_empty());
    }
}
