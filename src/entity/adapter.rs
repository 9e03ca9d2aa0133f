// ============================================================================
// spark-entities - Entity Adapter
// Pure state transitions over a normalized entity collection
// ============================================================================
//
// The adapter is the public face of the mutators: every operation takes the
// current state by value and hands back the next one. Which mutator runs is
// decided once, when the adapter is built:
//
//   no sort comparer  ->  UnsortedAdapter  (insertion order)
//   sort comparer     ->  SortedAdapter    (comparator order, merge-insertion)
//
// States that embed a collection next to other fields go through
// `HasEntityState`; the other fields are carried across untouched.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::id::{Id, Identified, SelectId};
use super::model::{Entity, SortComparer, Update};
use super::mutator::StateMutator;
use super::operator::operate;
use super::sorted::SortedAdapter;
use super::state::{EntityState, HasEntityState};
use super::unsorted::UnsortedAdapter;

// =============================================================================
// CONFIG
// =============================================================================

/// Options for `create_entity_adapter`.
pub struct EntityAdapterConfig<E> {
    pub select_id: SelectId<E>,
    pub sort_comparer: Option<SortComparer<E>>,
}

impl<E: Entity + Identified> EntityAdapterConfig<E> {
    /// Reads ids through `Identified`, keeps insertion order.
    pub fn new() -> Self {
        Self::with_resolver(SelectId::default_for())
    }
}

impl<E: Entity + Identified> Default for EntityAdapterConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityAdapterConfig<E> {
    /// Config for entities without an `Identified` impl.
    pub fn with_resolver(select_id: SelectId<E>) -> Self {
        Self {
            select_id,
            sort_comparer: None,
        }
    }

    pub fn with_select_id(mut self, select_id: SelectId<E>) -> Self {
        self.select_id = select_id;
        self
    }

    pub fn with_sort_comparer<F>(mut self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> std::cmp::Ordering + 'static,
    {
        self.sort_comparer = Some(Rc::new(compare));
        self
    }
}

impl<E> Clone for EntityAdapterConfig<E> {
    fn clone(&self) -> Self {
        Self {
            select_id: self.select_id.clone(),
            sort_comparer: self.sort_comparer.clone(),
        }
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Build an adapter, sorted when the config carries a comparer.
pub fn create_entity_adapter<E: Entity>(config: EntityAdapterConfig<E>) -> EntityAdapter<E> {
    let EntityAdapterConfig {
        select_id,
        sort_comparer,
    } = config;

    let mutator: Rc<dyn StateMutator<E>> = match &sort_comparer {
        Some(compare) => Rc::new(SortedAdapter::new(select_id.clone(), Rc::clone(compare))),
        None => Rc::new(UnsortedAdapter::new(select_id.clone())),
    };

    EntityAdapter {
        select_id,
        sort_comparer,
        mutator,
    }
}

// =============================================================================
// ENTITY ADAPTER
// =============================================================================

/// Structural operations over an `EntityState`.
///
/// Every operation returns the input state itself (same buffers) when nothing
/// changed, keeps the `ids` buffer when only entities changed, and replaces
/// both otherwise.
///
/// # Example
///
/// ```
/// use spark_entities::{EntityAdapter, EntityState, Id, SelectId, Entity};
///
/// #[derive(Debug)]
/// struct Book {
///     id: u32,
///     title: String,
/// }
///
/// impl Entity for Book {
///     type Changes = ();
///     fn apply(&self, _: &()) -> Self {
///         Book { id: self.id, title: self.title.clone() }
///     }
/// }
///
/// let adapter = EntityAdapter::sorted(
///     SelectId::new(|b: &Book| Some(Id::from(b.id))),
///     |a: &Book, b: &Book| a.title.cmp(&b.title),
/// );
///
/// let state = adapter.add_many(
///     vec![Book { id: 1, title: "b".into() }, Book { id: 2, title: "n".into() }],
///     EntityState::new(),
/// );
/// let state = adapter.add_one(Book { id: 3, title: "m".into() }, state);
/// assert_eq!(state.ids(), &[Id::from(1u32), Id::from(3u32), Id::from(2u32)]);
/// ```
pub struct EntityAdapter<E: Entity> {
    select_id: SelectId<E>,
    sort_comparer: Option<SortComparer<E>>,
    mutator: Rc<dyn StateMutator<E>>,
}

impl<E: Entity> EntityAdapter<E> {
    /// Insertion-ordered adapter.
    pub fn unsorted(select_id: SelectId<E>) -> Self {
        create_entity_adapter(EntityAdapterConfig::with_resolver(select_id))
    }

    /// Adapter that keeps `ids` ordered by `compare`.
    pub fn sorted<F>(select_id: SelectId<E>, compare: F) -> Self
    where
        F: Fn(&E, &E) -> std::cmp::Ordering + 'static,
    {
        create_entity_adapter(EntityAdapterConfig::with_resolver(select_id).with_sort_comparer(compare))
    }

    pub fn select_id(&self) -> &SelectId<E> {
        &self.select_id
    }

    pub fn sort_comparer(&self) -> Option<&SortComparer<E>> {
        self.sort_comparer.as_ref()
    }

    pub fn is_sorted(&self) -> bool {
        self.sort_comparer.is_some()
    }

    /// An empty collection.
    pub fn initial_state(&self) -> EntityState<E> {
        EntityState::new()
    }

    // =========================================================================
    // ADD / SET
    // =========================================================================

    /// Add an entity unless its id is already stored.
    pub fn add_one<S>(&self, entity: impl Into<Rc<E>>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        let entity = entity.into();
        operate(state, |draft| self.mutator.add_one(entity, draft))
    }

    /// Add entities whose ids are not stored yet. Within one batch the first
    /// entity for an id wins.
    pub fn add_many<S, I>(&self, entities: I, state: S) -> S
    where
        S: HasEntityState<E>,
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        let entities = collect_rc(entities);
        operate(state, |draft| self.mutator.add_many(entities, draft))
    }

    /// Insert or replace an entity.
    pub fn set_one<S>(&self, entity: impl Into<Rc<E>>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        let entity = entity.into();
        operate(state, |draft| self.mutator.set_one(entity, draft))
    }

    pub fn set_many<S, I>(&self, entities: I, state: S) -> S
    where
        S: HasEntityState<E>,
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        let entities = collect_rc(entities);
        operate(state, |draft| self.mutator.set_many(entities, draft))
    }

    /// Replace the whole collection. Always produces new buffers.
    pub fn set_all<S, I>(&self, entities: I, state: S) -> S
    where
        S: HasEntityState<E>,
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        let entities = collect_rc(entities);
        operate(state, |draft| self.mutator.set_all(entities, draft))
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    pub fn remove_one<S>(&self, id: impl Into<Id>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        let ids = [id.into()];
        operate(state, |draft| self.mutator.remove_many(&ids, draft))
    }

    /// Remove the given ids. Unknown ids are ignored.
    pub fn remove_many<S, I>(&self, ids: I, state: S) -> S
    where
        S: HasEntityState<E>,
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        let ids: Vec<Id> = ids.into_iter().map(Into::into).collect();
        operate(state, |draft| self.mutator.remove_many(&ids, draft))
    }

    /// Remove every entity matching `predicate`, evaluated before removal.
    pub fn remove_where<S, P>(&self, predicate: P, state: S) -> S
    where
        S: HasEntityState<E>,
        P: Fn(&E) -> bool,
    {
        operate(state, |draft| self.mutator.remove_where(&predicate, draft))
    }

    /// Empty the collection. Always produces new buffers.
    pub fn remove_all<S>(&self, mut state: S) -> S
    where
        S: HasEntityState<E>,
    {
        *state.entity_state_mut() = EntityState::new();
        state
    }

    // =========================================================================
    // UPDATE / UPSERT
    // =========================================================================

    pub fn update_one<S>(&self, update: Update<E>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        operate(state, |draft| self.mutator.update_one(update, draft))
    }

    /// Apply updates in order. Updates for unknown ids are dropped; an update
    /// that changes an entity's id moves it to the new key.
    pub fn update_many<S>(&self, updates: impl IntoIterator<Item = Update<E>>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        let updates: Vec<Update<E>> = updates.into_iter().collect();
        operate(state, |draft| self.mutator.update_many(updates, draft))
    }

    pub fn upsert_one<S>(&self, entity: impl Into<Rc<E>>, state: S) -> S
    where
        S: HasEntityState<E>,
    {
        let entity = entity.into();
        operate(state, |draft| self.mutator.upsert_one(entity, draft))
    }

    /// Update stored entities with the whole incoming entity, add the rest.
    pub fn upsert_many<S, I>(&self, entities: I, state: S) -> S
    where
        S: HasEntityState<E>,
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        let entities = collect_rc(entities);
        operate(state, |draft| self.mutator.upsert_many(entities, draft))
    }

    // =========================================================================
    // MAP
    // =========================================================================

    /// Replace the entity at `id` with `map(entity)`. Returning the same `Rc`
    /// leaves the state untouched.
    pub fn map_one<S, F>(&self, id: impl Into<Id>, map: F, state: S) -> S
    where
        S: HasEntityState<E>,
        F: Fn(&Rc<E>) -> Rc<E>,
    {
        let id = id.into();
        operate(state, |draft| self.mutator.map_one(&id, &map, draft))
    }

    /// Map every entity; entities the map returns unchanged are not touched.
    pub fn map<S, F>(&self, map: F, state: S) -> S
    where
        S: HasEntityState<E>,
        F: Fn(&Rc<E>) -> Rc<E>,
    {
        operate(state, |draft| self.mutator.map(&map, draft))
    }
}

impl<E: Entity> Clone for EntityAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            select_id: self.select_id.clone(),
            sort_comparer: self.sort_comparer.clone(),
            mutator: Rc::clone(&self.mutator),
        }
    }
}

impl<E: Entity> fmt::Debug for EntityAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityAdapter")
            .field("select_id", &self.select_id)
            .field("sorted", &self.sort_comparer.is_some())
            .finish()
    }
}

fn collect_rc<E, I>(entities: I) -> Vec<Rc<E>>
where
    I: IntoIterator,
    I::Item: Into<Rc<E>>,
{
    entities.into_iter().map(Into::into).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Todo {
        id: i64,
        done: bool,
    }

    impl Identified for Todo {
        fn id(&self) -> Option<Id> {
            Some(Id::from(self.id))
        }
    }

    impl Entity for Todo {
        type Changes = bool;

        fn apply(&self, done: &bool) -> Self {
            Todo {
                id: self.id,
                done: *done,
            }
        }
    }

    fn todo(id: i64) -> Todo {
        Todo { id, done: false }
    }

    fn adapter() -> EntityAdapter<Todo> {
        EntityAdapter::unsorted(SelectId::default_for())
    }

    #[derive(Debug, Clone, Default)]
    struct Screen {
        todos: EntityState<Todo>,
        filter: &'static str,
    }

    impl HasEntityState<Todo> for Screen {
        fn entity_state(&self) -> &EntityState<Todo> {
            &self.todos
        }

        fn entity_state_mut(&mut self) -> &mut EntityState<Todo> {
            &mut self.todos
        }
    }

    #[test]
    fn factory_picks_order_policy() {
        let unsorted = create_entity_adapter(EntityAdapterConfig::<Todo>::new());
        assert!(!unsorted.is_sorted());

        let sorted = create_entity_adapter(
            EntityAdapterConfig::<Todo>::new().with_sort_comparer(|a, b| b.id.cmp(&a.id)),
        );
        assert!(sorted.is_sorted());

        let state = sorted.add_many([todo(1), todo(3), todo(2)], EntityState::new());
        assert_eq!(state.ids(), &[Id::from(3), Id::from(2), Id::from(1)]);
    }

    #[test]
    fn no_op_returns_the_same_buffers() {
        let adapter = adapter();
        let state = adapter.add_one(todo(1), EntityState::new());
        let same = adapter.remove_one(9, state.clone());
        assert!(same.ptr_eq(&state));

        let same = adapter.add_one(todo(1), same);
        assert!(same.ptr_eq(&state));
    }

    #[test]
    fn update_keeps_ids_buffer() {
        let adapter = adapter();
        let state = adapter.add_many([todo(1), todo(2)], EntityState::new());
        let next = adapter.update_one(Update::new(2, true), state.clone());
        assert!(next.ids_ptr_eq(&state));
        assert!(next.get(&Id::from(2)).unwrap().done);
    }

    #[test]
    fn remove_all_always_replaces() {
        let adapter = adapter();
        let empty: EntityState<Todo> = EntityState::new();
        let next = adapter.remove_all(empty.clone());
        assert!(!next.ptr_eq(&empty));
        assert!(next.is_empty());
    }

    #[test]
    fn set_all_always_replaces() {
        let adapter = adapter();
        let state = adapter.add_many([todo(1), todo(2)], EntityState::new());
        let next = adapter.set_all(state.all(), state.clone());
        assert!(!next.ids_ptr_eq(&state));
        assert!(next.same_contents(&state));
    }

    #[test]
    fn embedded_state_keeps_other_fields() {
        let adapter = adapter();
        let screen = Screen {
            filter: "open",
            ..Default::default()
        };
        let screen = adapter.add_many([todo(1), todo(2)], screen);
        let screen = adapter.remove_where(|t: &Todo| t.id == 1, screen);
        assert_eq!(screen.filter, "open");
        assert_eq!(screen.todos.ids(), &[Id::from(2)]);
    }

    #[test]
    fn map_one_routes_through_update() {
        let adapter = adapter();
        let state = adapter.add_many([todo(1), todo(2)], EntityState::new());
        let next = adapter.map_one(
            1,
            |t: &Rc<Todo>| Rc::new(Todo { id: 5, done: t.done }),
            state,
        );
        assert_eq!(next.ids(), &[Id::from(5), Id::from(2)]);
    }
}
