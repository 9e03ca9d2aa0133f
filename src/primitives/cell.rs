// ============================================================================
// spark-entities - State Cell
// A synchronous, observable container for one state value
// ============================================================================
//
// The cell is the holder stores are built on. It may start uninitialized;
// reading then yields `None` and `update` fails. Writes notify through the
// scheduler, so batching and write-from-subscriber ordering apply uniformly.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::context::with_context;
use crate::core::types::{AnyReadable, EqualsFn, Listener, Listeners};
use crate::error::StoreError;
use crate::primitives::selector::Selector;
use crate::primitives::subscription::Subscription;
use crate::reactivity::equality::equals;
use crate::reactivity::scheduling::schedule;

// =============================================================================
// CELL INNER
// =============================================================================

pub(crate) struct CellInner<S> {
    value: RefCell<Option<S>>,
    /// Global write version of the last write, 0 before the first one
    version: Cell<u64>,
    listeners: Rc<Listeners>,
    /// A notification job for this cell is already queued
    notify_queued: Cell<bool>,
    /// Version and value being delivered by the running notification job
    delivering: RefCell<Option<(u64, S)>>,
}

impl<S: Clone + 'static> CellInner<S> {
    fn new(value: Option<S>) -> Self {
        let version = if value.is_some() {
            with_context(|ctx| ctx.increment_write_version())
        } else {
            0
        };

        Self {
            value: RefCell::new(value),
            version: Cell::new(version),
            listeners: Rc::new(Listeners::new()),
            notify_queued: Cell::new(false),
            delivering: RefCell::new(None),
        }
    }

    /// Queue one notification; writes made before it runs coalesce into it.
    fn queue_notify(self: &Rc<Self>) {
        if self.notify_queued.replace(true) {
            return;
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.notify_queued.set(false);
                inner.deliver();
            }
        }));
    }

    /// Notify listeners with a snapshot of the current value.
    ///
    /// Listeners see the snapshot even if one of them writes to the cell; that
    /// write gets its own pass once this one finishes.
    fn deliver(&self) {
        let snapshot = self.value.borrow().clone().map(|v| (self.version.get(), v));
        self.delivering.replace(snapshot);
        self.listeners.notify();
        self.delivering.replace(None);
    }

    /// The value listeners should observe right now.
    fn observed(&self) -> Option<S> {
        if let Some((_, value)) = &*self.delivering.borrow() {
            return Some(value.clone());
        }
        self.value.borrow().clone()
    }
}

impl<S> AnyReadable<S> for CellInner<S> {
    fn version(&self) -> u64 {
        match &*self.delivering.borrow() {
            Some((version, _)) => *version,
            None => self.version.get(),
        }
    }

    fn peek(&self, f: &mut dyn FnMut(&S)) -> bool {
        if let Some((_, value)) = &*self.delivering.borrow() {
            f(value);
            return true;
        }
        match &*self.value.borrow() {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    fn listen(&self, listener: Listener) -> Subscription {
        let id = self.listeners.add(listener);
        Subscription::new(Rc::downgrade(&self.listeners), id)
    }
}

// =============================================================================
// STATE CELL
// =============================================================================

/// An observable state value.
///
/// Clones share the same value and subscribers.
///
/// # Example
///
/// ```
/// use spark_entities::StateCell;
///
/// let cell: StateCell<Vec<u32>> = StateCell::uninitialized();
/// assert!(cell.update(|v| v.clone()).is_err());
///
/// cell.set(vec![1]);
/// cell.update(|v| [v.as_slice(), &[2]].concat()).unwrap();
/// assert_eq!(cell.get(), Some(vec![1, 2]));
/// ```
pub struct StateCell<S> {
    inner: Rc<CellInner<S>>,
}

impl<S: Clone + 'static> StateCell<S> {
    pub fn new(value: S) -> Self {
        Self {
            inner: Rc::new(CellInner::new(Some(value))),
        }
    }

    /// A cell without a value. `get` returns `None` until the first `set`.
    pub fn uninitialized() -> Self {
        Self {
            inner: Rc::new(CellInner::new(None)),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> Option<S> {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` must not write to this cell.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.inner.value.borrow().as_ref().map(f)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Version of the last write, 0 if never written.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: S) {
        let previous = self.inner.value.replace(Some(value));
        let version = with_context(|ctx| ctx.increment_write_version());
        self.inner.version.set(version);
        drop(previous);

        self.inner.queue_notify();
    }

    /// Replace the value with `f(current)`.
    ///
    /// Fails with `StoreError::NotInitialized` if the cell has no value.
    pub fn update(&self, f: impl FnOnce(&S) -> S) -> Result<(), StoreError> {
        let current = self.get().ok_or(StoreError::NotInitialized)?;
        self.set(f(&current));
        Ok(())
    }

    /// Call `f` with the current value now (if any) and after every change.
    pub fn subscribe(&self, f: impl Fn(&S) + 'static) -> Subscription {
        let f = Rc::new(f);

        if let Some(current) = self.get() {
            f(&current);
        }

        let weak = Rc::downgrade(&self.inner);
        let listener: Listener = Rc::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Some(current) = inner.observed() {
                f(&current);
            }
        });

        self.inner.listen(listener)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// A memoized projection compared with `PartialEq`.
    pub fn select<T, F>(&self, project: F) -> Selector<T>
    where
        T: Clone + PartialEq + 'static,
        F: Fn(&S) -> T + 'static,
    {
        self.select_with_equals(project, equals)
    }

    /// A memoized projection compared with `equals`.
    pub fn select_with_equals<T, F>(&self, project: F, equals: EqualsFn<T>) -> Selector<T>
    where
        T: Clone + 'static,
        F: Fn(&S) -> T + 'static,
    {
        Selector::from_source(self.readable(), project, equals)
    }

    pub(crate) fn readable(&self) -> Rc<dyn AnyReadable<S>> {
        self.inner.clone()
    }
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StateCell<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
