// ============================================================================
// spark-entities - Entity Store Config
// ============================================================================

use std::cmp::Ordering;
use std::rc::Rc;

use crate::entity::adapter::EntityAdapterConfig;
use crate::entity::id::{Identified, SelectId};
use crate::entity::model::{Entity, SortComparer};

/// Options for `EntityStore::new`.
///
/// Without an initial state the store starts uninitialized: selectors yield
/// `None` and updaters fail until `set_state` is called.
pub struct EntityStoreConfig<S, E> {
    pub initial_state: Option<S>,
    pub select_id: SelectId<E>,
    pub sort_comparer: Option<SortComparer<E>>,
}

impl<S, E: Entity + Identified> EntityStoreConfig<S, E> {
    /// Uninitialized, unsorted, ids read through `Identified`.
    pub fn new() -> Self {
        Self::with_resolver(SelectId::default_for())
    }
}

impl<S, E: Entity + Identified> Default for EntityStoreConfig<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E: Entity> EntityStoreConfig<S, E> {
    pub fn with_resolver(select_id: SelectId<E>) -> Self {
        Self {
            initial_state: None,
            select_id,
            sort_comparer: None,
        }
    }

    pub fn with_initial_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn with_select_id(mut self, select_id: SelectId<E>) -> Self {
        self.select_id = select_id;
        self
    }

    pub fn with_sort_comparer<F>(mut self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + 'static,
    {
        self.sort_comparer = Some(Rc::new(compare));
        self
    }

    /// Split into the initial state and the adapter options.
    pub(crate) fn into_parts(self) -> (Option<S>, EntityAdapterConfig<E>) {
        let adapter = EntityAdapterConfig {
            select_id: self.select_id,
            sort_comparer: self.sort_comparer,
        };
        (self.initial_state, adapter)
    }
}
