// ============================================================================
// spark-entities - Entity Store
// A state cell holding an entity collection, with selectors and updaters
// ============================================================================
//
// Selector graph, built once per store:
//
//   state cell ──> collection ─┬─> ids ──> total
//                              ├─> entities
//                              └─> all
//
// `collection` compares by buffer identity, so a write that leaves the entity
// collection untouched (a patch of other fields, a no-op updater) recomputes
// nothing downstream.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::types::EqualsFn;
use crate::entity::adapter::{EntityAdapter, create_entity_adapter};
use crate::entity::id::Id;
use crate::entity::model::Entity;
use crate::entity::state::{EntityMapping, EntityState, HasEntityState};
use crate::error::StoreError;
use crate::primitives::cell::StateCell;
use crate::primitives::selector::Selector;
use crate::primitives::subscription::Subscription;
use crate::reactivity::equality::{equals, never_equals, ptr_equals_slice, rc_ptr_equals};

use super::config::EntityStoreConfig;
use super::updaters::EntityUpdaters;

// =============================================================================
// ENTITY STORE
// =============================================================================

/// Observable state with entity updaters and selectors.
///
/// `S` is the whole state; it embeds the entity collection through
/// `HasEntityState`. Clones share the same cell and selectors.
///
/// # Example
///
/// ```
/// use spark_entities::{EntityStore, EntityStoreConfig, EntityState, EntityUpdaters, Record};
///
/// let store = EntityStore::new(
///     EntityStoreConfig::<EntityState<Record>, Record>::new()
///         .with_initial_state(EntityState::new()),
/// );
///
/// store.add_one(Record::new().with("id", 1).with("name", "Ada")).unwrap();
/// store.add_one(Record::new().with("id", 2).with("name", "Grace")).unwrap();
///
/// assert_eq!(store.total().get(), Some(2));
/// ```
pub struct EntityStore<S, E: Entity> {
    cell: StateCell<S>,
    adapter: EntityAdapter<E>,
    state: Selector<S>,
    ids: Selector<Rc<Vec<Id>>>,
    entities: Selector<Rc<EntityMapping<E>>>,
    all: Selector<Vec<Rc<E>>>,
    total: Selector<usize>,
}

fn same_collection<E>(a: &EntityState<E>, b: &EntityState<E>) -> bool {
    a.ptr_eq(b)
}

impl<S, E> EntityStore<S, E>
where
    S: HasEntityState<E> + Clone + 'static,
    E: Entity,
{
    pub fn new(config: EntityStoreConfig<S, E>) -> Self {
        let (initial_state, adapter_config) = config.into_parts();
        let adapter = create_entity_adapter(adapter_config);

        let cell = match initial_state {
            Some(state) => StateCell::new(state),
            None => StateCell::uninitialized(),
        };

        tracing::debug!(
            sorted = adapter.is_sorted(),
            initialized = cell.is_initialized(),
            select_id = adapter.select_id().label(),
            "entity store created"
        );

        let state = cell.select_with_equals(S::clone, never_equals);
        let collection_equals: EqualsFn<EntityState<E>> = same_collection;
        let collection = cell.select_with_equals(|s: &S| s.entity_state().clone(), collection_equals);

        let ids = collection.map_with_equals(|c| c.ids_rc().clone(), rc_ptr_equals);
        let entities = collection.map_with_equals(|c| c.entities_rc().clone(), rc_ptr_equals);
        let all = collection.map_with_equals(EntityState::all, ptr_equals_slice);
        let total = ids.map_with_equals(|ids| ids.len(), equals);

        Self {
            cell,
            adapter,
            state,
            ids,
            entities,
            all,
            total,
        }
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Current state, `None` while uninitialized.
    pub fn get(&self) -> Option<S> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.is_initialized()
    }

    /// Replace the whole state. Also initializes an uninitialized store.
    pub fn set_state(&self, state: S) {
        self.cell.set(state);
    }

    /// Replace the state with `f(current)`.
    pub fn update_state(&self, f: impl FnOnce(&S) -> S) -> Result<(), StoreError> {
        self.cell.update(f)
    }

    /// Modify a copy of the current state in place and store it.
    pub fn patch_state(&self, patch: impl FnOnce(&mut S)) -> Result<(), StoreError> {
        self.cell.update(|state| {
            let mut next = state.clone();
            patch(&mut next);
            next
        })
    }

    /// Call `f` with the state now (if any) and after every write.
    pub fn subscribe(&self, f: impl Fn(&S) + 'static) -> Subscription {
        self.cell.subscribe(f)
    }

    pub fn cell(&self) -> &StateCell<S> {
        &self.cell
    }

    pub fn adapter(&self) -> &EntityAdapter<E> {
        &self.adapter
    }

    // =========================================================================
    // SELECTORS
    // =========================================================================

    /// The whole state; notifies on every write.
    pub fn state(&self) -> Selector<S> {
        self.state.clone()
    }

    /// The id order. Same `Rc` until the order changes.
    pub fn ids(&self) -> Selector<Rc<Vec<Id>>> {
        self.ids.clone()
    }

    /// The entity dictionary. Same `Rc` until an entity changes.
    pub fn entities(&self) -> Selector<Rc<EntityMapping<E>>> {
        self.entities.clone()
    }

    /// All entities in id order.
    pub fn all(&self) -> Selector<Vec<Rc<E>>> {
        self.all.clone()
    }

    pub fn total(&self) -> Selector<usize> {
        self.total.clone()
    }

    /// A custom projection of the state compared with `PartialEq`.
    pub fn select<T, F>(&self, project: F) -> Selector<T>
    where
        T: Clone + PartialEq + 'static,
        F: Fn(&S) -> T + 'static,
    {
        self.cell.select(project)
    }

    pub fn select_with_equals<T, F>(&self, project: F, equals: EqualsFn<T>) -> Selector<T>
    where
        T: Clone + 'static,
        F: Fn(&S) -> T + 'static,
    {
        self.cell.select_with_equals(project, equals)
    }

    // =========================================================================
    // PATCHED UPDATES
    // =========================================================================

    /// Updaters that also apply `patch` to the rest of the state.
    ///
    /// The patch runs first; the patched state and the entity change are
    /// written in one `set`.
    ///
    /// ```
    /// use spark_entities::{
    ///     EntityState, EntityStore, EntityStoreConfig, EntityUpdaters, HasEntityState, Record,
    /// };
    ///
    /// #[derive(Clone, Default)]
    /// struct Screen {
    ///     items: EntityState<Record>,
    ///     selected: Option<i64>,
    /// }
    ///
    /// impl HasEntityState<Record> for Screen {
    ///     fn entity_state(&self) -> &EntityState<Record> { &self.items }
    ///     fn entity_state_mut(&mut self) -> &mut EntityState<Record> { &mut self.items }
    /// }
    ///
    /// let store = EntityStore::new(
    ///     EntityStoreConfig::<Screen, Record>::new().with_initial_state(Screen::default()),
    /// );
    /// store
    ///     .patched(|s: &mut Screen| s.selected = Some(1))
    ///     .add_one(Record::new().with("id", 1))
    ///     .unwrap();
    ///
    /// let state = store.get().unwrap();
    /// assert_eq!(state.selected, Some(1));
    /// assert_eq!(state.items.total(), 1);
    /// ```
    pub fn patched<P>(&self, patch: P) -> Patched<'_, S, E, P>
    where
        P: Fn(&mut S),
    {
        Patched { store: self, patch }
    }
}

impl<S, E> EntityUpdaters<S, E> for EntityStore<S, E>
where
    S: HasEntityState<E> + Clone + 'static,
    E: Entity,
{
    fn apply_entity_op<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&EntityAdapter<E>, S) -> S,
    {
        self.cell.update(|state| op(&self.adapter, state.clone()))
    }
}

impl<S, E: Entity> Clone for EntityStore<S, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            adapter: self.adapter.clone(),
            state: self.state.clone(),
            ids: self.ids.clone(),
            entities: self.entities.clone(),
            all: self.all.clone(),
            total: self.total.clone(),
        }
    }
}

impl<S: fmt::Debug, E: Entity> fmt::Debug for EntityStore<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("cell", &self.cell)
            .field("adapter", &self.adapter)
            .finish()
    }
}

// =============================================================================
// PATCHED
// =============================================================================

/// Updater handle returned by `EntityStore::patched`.
pub struct Patched<'a, S, E: Entity, P> {
    store: &'a EntityStore<S, E>,
    patch: P,
}

impl<S, E, P> EntityUpdaters<S, E> for Patched<'_, S, E, P>
where
    S: HasEntityState<E> + Clone + 'static,
    E: Entity,
    P: Fn(&mut S),
{
    fn apply_entity_op<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&EntityAdapter<E>, S) -> S,
    {
        self.store.cell.update(|state| {
            let mut next = state.clone();
            (self.patch)(&mut next);
            op(&self.store.adapter, next)
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
