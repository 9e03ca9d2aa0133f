// ============================================================================
// spark-entities - Entity Updaters
// Structural operations applied to a store's current state
// ============================================================================
//
// Implementors provide one hook, `apply_entity_op`, that runs an adapter
// operation against the current state and writes the result back. Every
// updater below is a thin wrapper around that hook, so the store, the
// patched-state handle and the data store share one definition.
// ============================================================================

use std::rc::Rc;

use crate::entity::adapter::EntityAdapter;
use crate::entity::id::Id;
use crate::entity::model::{Entity, Update};
use crate::entity::state::HasEntityState;
use crate::error::StoreError;

/// The structural operations of an entity store.
///
/// Every updater fails with `StoreError::NotInitialized` when the store has no
/// state yet; nothing else can fail.
pub trait EntityUpdaters<S: HasEntityState<E>, E: Entity> {
    /// Replace the current state with `op(adapter, state)`.
    fn apply_entity_op<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: FnOnce(&EntityAdapter<E>, S) -> S;

    fn add_one(&self, entity: impl Into<Rc<E>>) -> Result<(), StoreError> {
        let entity = entity.into();
        self.apply_entity_op(|adapter, state| adapter.add_one(entity, state))
    }

    fn add_many<I>(&self, entities: I) -> Result<(), StoreError>
    where
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        self.apply_entity_op(|adapter, state| adapter.add_many(entities, state))
    }

    fn set_one(&self, entity: impl Into<Rc<E>>) -> Result<(), StoreError> {
        let entity = entity.into();
        self.apply_entity_op(|adapter, state| adapter.set_one(entity, state))
    }

    fn set_many<I>(&self, entities: I) -> Result<(), StoreError>
    where
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        self.apply_entity_op(|adapter, state| adapter.set_many(entities, state))
    }

    fn set_all<I>(&self, entities: I) -> Result<(), StoreError>
    where
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        self.apply_entity_op(|adapter, state| adapter.set_all(entities, state))
    }

    fn remove_one(&self, id: impl Into<Id>) -> Result<(), StoreError> {
        let id = id.into();
        self.apply_entity_op(|adapter, state| adapter.remove_one(id, state))
    }

    fn remove_many<I>(&self, ids: I) -> Result<(), StoreError>
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.apply_entity_op(|adapter, state| adapter.remove_many(ids, state))
    }

    fn remove_where<P>(&self, predicate: P) -> Result<(), StoreError>
    where
        P: Fn(&E) -> bool,
    {
        self.apply_entity_op(|adapter, state| adapter.remove_where(predicate, state))
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        self.apply_entity_op(|adapter, state| adapter.remove_all(state))
    }

    fn update_one(&self, update: Update<E>) -> Result<(), StoreError> {
        self.apply_entity_op(|adapter, state| adapter.update_one(update, state))
    }

    fn update_many<I>(&self, updates: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = Update<E>>,
    {
        self.apply_entity_op(|adapter, state| adapter.update_many(updates, state))
    }

    fn upsert_one(&self, entity: impl Into<Rc<E>>) -> Result<(), StoreError> {
        let entity = entity.into();
        self.apply_entity_op(|adapter, state| adapter.upsert_one(entity, state))
    }

    fn upsert_many<I>(&self, entities: I) -> Result<(), StoreError>
    where
        I: IntoIterator,
        I::Item: Into<Rc<E>>,
    {
        self.apply_entity_op(|adapter, state| adapter.upsert_many(entities, state))
    }

    fn map_one<F>(&self, id: impl Into<Id>, map: F) -> Result<(), StoreError>
    where
        F: Fn(&Rc<E>) -> Rc<E>,
    {
        let id = id.into();
        self.apply_entity_op(|adapter, state| adapter.map_one(id, map, state))
    }

    fn map<F>(&self, map: F) -> Result<(), StoreError>
    where
        F: Fn(&Rc<E>) -> Rc<E>,
    {
        self.apply_entity_op(|adapter, state| adapter.map(map, state))
    }
}
