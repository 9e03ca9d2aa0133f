// ============================================================================
// spark-entities - Entity State
// The normalized {ids, entities} collection and its mutable draft
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::ser::{Error as _, SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use super::id::Id;
use crate::error::StateError;

/// The entity dictionary.
pub type EntityMapping<E> = HashMap<Id, Rc<E>>;

// =============================================================================
// ENTITY STATE
// =============================================================================

/// A normalized collection of entities.
///
/// `ids` orders the collection and `entities` indexes it; both always hold the
/// same set of ids. Cloning shares both buffers, so clones compare equal under
/// `ptr_eq` until one of them is replaced by an adapter operation.
pub struct EntityState<E> {
    ids: Rc<Vec<Id>>,
    entities: Rc<EntityMapping<E>>,
}

impl<E> EntityState<E> {
    /// An empty collection.
    pub fn new() -> Self {
        Self {
            ids: Rc::new(Vec::new()),
            entities: Rc::new(HashMap::new()),
        }
    }

    /// The state a store starts from; same as `new`.
    pub fn initial() -> Self {
        Self::new()
    }

    /// Build a collection from an id order and a dictionary.
    ///
    /// Fails unless both describe exactly the same set of ids.
    pub fn from_parts(ids: Vec<Id>, entities: EntityMapping<E>) -> Result<Self, StateError> {
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id) {
                return Err(StateError::DuplicateId(id.clone()));
            }
            if !entities.contains_key(id) {
                return Err(StateError::MissingEntity(id.clone()));
            }
        }
        if let Some(orphan) = entities.keys().find(|id| !seen.contains(id)) {
            return Err(StateError::OrphanEntity(orphan.clone()));
        }

        Ok(Self {
            ids: Rc::new(ids),
            entities: Rc::new(entities),
        })
    }

    pub(crate) fn from_shared(ids: Rc<Vec<Id>>, entities: Rc<EntityMapping<E>>) -> Self {
        Self { ids, entities }
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    /// The shared id buffer (the memoization key for order-dependent views).
    pub fn ids_rc(&self) -> &Rc<Vec<Id>> {
        &self.ids
    }

    pub fn entities(&self) -> &EntityMapping<E> {
        &self.entities
    }

    pub fn entities_rc(&self) -> &Rc<EntityMapping<E>> {
        &self.entities
    }

    pub fn get(&self, id: &Id) -> Option<&Rc<E>> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.entities.contains_key(id)
    }

    /// All entities in `ids` order.
    pub fn all(&self) -> Vec<Rc<E>> {
        self.ids
            .iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect()
    }

    /// Iterate entities in `ids` order.
    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Rc<E>)> {
        self.ids
            .iter()
            .filter_map(|id| self.entities.get(id).map(|entity| (id, entity)))
    }

    pub fn total(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when both buffers are shared with `other`.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ids_ptr_eq(other) && self.entities_ptr_eq(other)
    }

    pub fn ids_ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ids, &other.ids)
    }

    pub fn entities_ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entities, &other.entities)
    }

    /// Same ids in the same order, each mapped to the same entity allocation.
    pub fn same_contents(&self, other: &Self) -> bool {
        self.ids == other.ids
            && self.entities.len() == other.entities.len()
            && self.entities.iter().all(|(id, entity)| {
                other
                    .entities
                    .get(id)
                    .is_some_and(|theirs| Rc::ptr_eq(entity, theirs))
            })
    }

    pub(crate) fn draft(&self) -> EntityDraft<E> {
        EntityDraft {
            ids: (*self.ids).clone(),
            entities: (*self.entities).clone(),
        }
    }
}

impl<E> Clone for EntityState<E> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            entities: self.entities.clone(),
        }
    }
}

impl<E> Default for EntityState<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PartialEq> PartialEq for EntityState<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.entities == other.entities
    }
}

impl<E: fmt::Debug> fmt::Debug for EntityState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityState")
            .field("ids", &self.ids)
            .field("entities", &self.entities)
            .finish()
    }
}

/// Entities keyed by the display form of their id, in `ids` order.
struct KeyedEntities<'a, E>(&'a EntityState<E>);

impl<E: Serialize> Serialize for KeyedEntities<'_, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut keys = HashSet::with_capacity(self.0.total());
        let mut map = serializer.serialize_map(Some(self.0.total()))?;
        for (id, entity) in self.0.iter() {
            let key = id.to_string();
            if !keys.insert(key.clone()) {
                return Err(S::Error::custom(format!(
                    "entity ids collide on serialized key {key:?}"
                )));
            }
            map.serialize_entry(&key, &**entity)?;
        }
        map.end()
    }
}

/// Serializes as `{ "ids": [...], "entities": { "<id>": ... } }`.
///
/// Entity keys are the display form of the id, so `Id::Num(1)` and
/// `Id::Str("1")` map to the same key. Serializing a collection holding both
/// fails instead of dropping one of them.
impl<E: Serialize> Serialize for EntityState<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntityState", 2)?;
        state.serialize_field("ids", &*self.ids)?;
        state.serialize_field("entities", &KeyedEntities(self))?;
        state.end()
    }
}

// =============================================================================
// HAS ENTITY STATE
// =============================================================================

/// States that embed an entity collection next to other fields.
///
/// Adapter operations replace only the embedded collection and carry every
/// other field through untouched.
pub trait HasEntityState<E> {
    fn entity_state(&self) -> &EntityState<E>;

    fn entity_state_mut(&mut self) -> &mut EntityState<E>;
}

impl<E> HasEntityState<E> for EntityState<E> {
    fn entity_state(&self) -> &EntityState<E> {
        self
    }

    fn entity_state_mut(&mut self) -> &mut EntityState<E> {
        self
    }
}

// =============================================================================
// ENTITY DRAFT
// =============================================================================

/// Exclusively owned, mutable copy of a collection.
///
/// Mutators work on a draft; the operator wrapper freezes it back into an
/// `EntityState`.
pub(crate) struct EntityDraft<E> {
    pub(crate) ids: Vec<Id>,
    pub(crate) entities: EntityMapping<E>,
}

impl<E> EntityDraft<E> {
    pub(crate) fn contains(&self, id: &Id) -> bool {
        self.entities.contains_key(id)
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
        self.entities.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> (Vec<Id>, EntityMapping<&'static str>) {
        let ids = vec![Id::from(1), Id::from(2)];
        let entities = HashMap::from([(Id::from(1), Rc::new("a")), (Id::from(2), Rc::new("b"))]);
        (ids, entities)
    }

    #[test]
    fn empty_by_default() {
        let state: EntityState<i32> = EntityState::default();
        assert!(state.is_empty());
        assert_eq!(state.total(), 0);
        assert!(state.all().is_empty());
    }

    #[test]
    fn from_parts_accepts_consistent_state() {
        let (ids, entities) = parts();
        let state = EntityState::from_parts(ids, entities).unwrap();
        assert_eq!(state.total(), 2);
        assert_eq!(*state.all()[1], "b");
    }

    #[test]
    fn from_parts_rejects_duplicates() {
        let (mut ids, entities) = parts();
        ids.push(Id::from(1));
        let err = EntityState::from_parts(ids, entities).unwrap_err();
        assert_eq!(err, StateError::DuplicateId(Id::from(1)));
    }

    #[test]
    fn from_parts_rejects_missing_entity() {
        let (mut ids, entities) = parts();
        ids.push(Id::from(3));
        let err = EntityState::from_parts(ids, entities).unwrap_err();
        assert_eq!(err, StateError::MissingEntity(Id::from(3)));
    }

    #[test]
    fn from_parts_rejects_orphans() {
        let (mut ids, entities) = parts();
        ids.pop();
        let err = EntityState::from_parts(ids, entities).unwrap_err();
        assert_eq!(err, StateError::OrphanEntity(Id::from(2)));
    }

    #[test]
    fn clones_share_buffers() {
        let (ids, entities) = parts();
        let state = EntityState::from_parts(ids, entities).unwrap();
        let copy = state.clone();
        assert!(state.ptr_eq(&copy));
        assert!(state.same_contents(&copy));
    }

    #[test]
    fn serializes_with_keyed_entities() {
        let (ids, entities) = parts();
        let state = EntityState::from_parts(ids, entities).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ids": [1, 2], "entities": { "1": "a", "2": "b" } })
        );
    }

    #[test]
    fn serializing_colliding_keys_fails() {
        let ids = vec![Id::from(1), Id::from("1")];
        let entities = HashMap::from([(Id::from(1), Rc::new("num")), (Id::from("1"), Rc::new("str"))]);
        let state = EntityState::from_parts(ids, entities).unwrap();

        let err = serde_json::to_value(&state).unwrap_err();
        assert!(err.to_string().contains("collide"));
    }
}
