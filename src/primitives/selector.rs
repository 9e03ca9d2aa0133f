// ============================================================================
// spark-entities - Selector
// Memoized projection of a cell or of another selector
// ============================================================================
//
// A selector recomputes lazily: on read it compares its source's version with
// the one it last computed from. A recomputed value that is equal to the
// cached one (under the selector's equality) is dropped, so the cached value
// keeps its identity and subscribers are not told.
//
// Selectors also listen to their source while alive. When the source notifies
// and the value really changed, the selector notifies its own subscribers in
// the same pass. Every selector in a chain reads the value the source is
// delivering, which keeps a chain rooted in one cell glitch-free.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::core::context::with_context;
use crate::core::types::{AnyReadable, EqualsFn, Listener, Listeners};
use crate::primitives::subscription::Subscription;
use crate::reactivity::equality::equals;

// =============================================================================
// SELECTOR INNER
// =============================================================================

struct SelectorInner<T> {
    source_version: Box<dyn Fn() -> u64>,
    compute: Box<dyn Fn() -> Option<T>>,
    equals: EqualsFn<T>,

    value: RefCell<Option<T>>,
    /// Source version the cached value was computed from
    computed_from: Cell<Option<u64>>,
    /// Bumped whenever the cached value is replaced
    version: Cell<u64>,
    /// The cached value changed since subscribers were last notified
    unseen_change: Cell<bool>,

    listeners: Rc<Listeners>,
    upstream: RefCell<Option<Subscription>>,
}

impl<T: Clone + 'static> SelectorInner<T> {
    fn refresh(&self) {
        let source_version = (self.source_version)();
        if self.computed_from.get() == Some(source_version) {
            return;
        }
        self.computed_from.set(Some(source_version));

        let next = (self.compute)();
        let changed = match (&*self.value.borrow(), &next) {
            (Some(current), Some(next)) => !(self.equals)(current, next),
            (None, None) => false,
            _ => true,
        };

        if changed {
            let previous = self.value.replace(next);
            drop(previous);
            self.version
                .set(with_context(|ctx| ctx.increment_write_version()));
            self.unseen_change.set(true);
        }
    }

    fn on_source_changed(&self) {
        self.refresh();
        if self.unseen_change.replace(false) {
            self.listeners.notify();
        }
    }

    fn current(&self) -> Option<T> {
        self.refresh();
        self.value.borrow().clone()
    }
}

impl<T: Clone + 'static> AnyReadable<T> for SelectorInner<T> {
    fn version(&self) -> u64 {
        self.refresh();
        self.version.get()
    }

    fn peek(&self, f: &mut dyn FnMut(&T)) -> bool {
        self.refresh();
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
// SELECTOR
// =============================================================================

/// A read-only, memoized view of reactive state.
///
/// `get` returns `None` while the underlying cell is uninitialized.
///
/// # Example
///
/// ```
/// use spark_entities::StateCell;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let cell = StateCell::new((1, "a"));
/// let first = cell.select(|s| s.0);
///
/// let runs = Rc::new(Cell::new(0));
/// let _sub = first.subscribe({
///     let runs = runs.clone();
///     move |_| runs.set(runs.get() + 1)
/// });
///
/// cell.set((1, "b")); // projection unchanged
/// cell.set((2, "b"));
///
/// assert_eq!(first.get(), Some(2));
/// assert_eq!(runs.get(), 2); // replay + one change
/// ```
pub struct Selector<T> {
    inner: Rc<SelectorInner<T>>,
}

impl<T: Clone + 'static> Selector<T> {
    pub(crate) fn from_source<S, F>(source: Rc<dyn AnyReadable<S>>, project: F, equals: EqualsFn<T>) -> Self
    where
        S: 'static,
        F: Fn(&S) -> T + 'static,
    {
        let versioned = source.clone();
        let computing = source.clone();

        let inner = Rc::new(SelectorInner {
            source_version: Box::new(move || versioned.version()),
            compute: Box::new(move || {
                let mut out = None;
                computing.peek(&mut |value| out = Some(project(value)));
                out
            }),
            equals,
            value: RefCell::new(None),
            computed_from: Cell::new(None),
            version: Cell::new(0),
            unseen_change: Cell::new(false),
            listeners: Rc::new(Listeners::new()),
            upstream: RefCell::new(None),
        });

        inner.refresh();
        inner.unseen_change.set(false);

        let weak = Rc::downgrade(&inner);
        let upstream = source.listen(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_source_changed();
            }
        }));
        *inner.upstream.borrow_mut() = Some(upstream);

        Self { inner }
    }

    /// Clone of the current projected value.
    pub fn get(&self) -> Option<T> {
        self.inner.current()
    }

    /// Borrow the current projected value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.inner.refresh();
        self.inner.value.borrow().as_ref().map(f)
    }

    /// Version of the cached value; moves only when the value changes.
    pub fn version(&self) -> u64 {
        AnyReadable::version(&*self.inner)
    }

    /// Call `f` with the current value now (if any) and after every change.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let f = Rc::new(f);

        if let Some(current) = self.get() {
            f(&current);
        }

        let weak = Rc::downgrade(&self.inner);
        self.inner.listen(Rc::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let current = inner.value.borrow().clone();
            if let Some(current) = current {
                f(&current);
            }
        }))
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Chain a projection compared with `PartialEq`.
    pub fn map<U, F>(&self, project: F) -> Selector<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.map_with_equals(project, equals)
    }

    /// Chain a projection compared with `equals`.
    pub fn map_with_equals<U, F>(&self, project: F, equals: EqualsFn<U>) -> Selector<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let source: Rc<dyn AnyReadable<T>> = self.inner.clone();
        Selector::from_source(source, project, equals)
    }
}

impl<T> Clone for Selector<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
