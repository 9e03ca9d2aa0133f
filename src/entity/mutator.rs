// ============================================================================
// spark-entities - State Mutators
// The in-place mutation interface shared by the unsorted and sorted adapters
// ============================================================================
//
// Each adapter implements the primitives that depend on its order policy
// (add, set, update, remove). Everything that is only a composition of those
// primitives (upsert, map, the *_many folds) is written once here and routed
// back through the implementing adapter, so it inherits that adapter's
// ordering behaviour.
// ============================================================================

use std::rc::Rc;

use super::id::{Id, SelectId, select_id_value};
use super::model::{Changes, Entity, EntityMap, MutationResult, Predicate, Update};
use super::state::EntityDraft;

pub(crate) trait StateMutator<E: Entity> {
    fn select_id(&self) -> &SelectId<E>;

    // =========================================================================
    // PRIMITIVES
    // =========================================================================

    fn add_many(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult;

    fn set_one(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult;

    fn update_many(&self, updates: Vec<Update<E>>, draft: &mut EntityDraft<E>) -> MutationResult;

    fn remove_many(&self, ids: &[Id], draft: &mut EntityDraft<E>) -> MutationResult;

    // =========================================================================
    // COMPOSITIONS
    // =========================================================================

    fn add_one(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        self.add_many(vec![entity], draft)
    }

    fn set_many(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        MutationResult::combine_all(
            entities
                .into_iter()
                .map(|entity| self.set_one(entity, draft)),
        )
    }

    /// Replace the whole collection. Always reports `Both`, even when the
    /// result happens to equal the input.
    fn set_all(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        draft.clear();
        self.add_many(entities, draft);
        MutationResult::Both
    }

    fn remove_where(&self, predicate: &Predicate<'_, E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let ids: Vec<Id> = draft
            .ids
            .iter()
            .filter(|id| draft.entities.get(*id).is_some_and(|entity| predicate(&**entity)))
            .cloned()
            .collect();

        self.remove_many(&ids, draft)
    }

    fn update_one(&self, update: Update<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        self.update_many(vec![update], draft)
    }

    fn upsert_one(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        self.upsert_many(vec![entity], draft)
    }

    /// Entities already stored become whole-entity updates, the rest are added.
    fn upsert_many(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        let mut updated = Vec::new();
        let mut added = Vec::new();

        for entity in entities {
            let id = select_id_value(&*entity, self.select_id());
            if draft.contains(&id) {
                updated.push(Update {
                    id,
                    changes: Changes::Whole(entity),
                });
            } else {
                added.push(entity);
            }
        }

        let by_updated = self.update_many(updated, draft);
        let by_added = self.add_many(added, draft);

        by_updated.combine(by_added)
    }

    fn map_one(&self, id: &Id, map: &EntityMap<'_, E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let Some(entity) = draft.entities.get(id).cloned() else {
            return MutationResult::None;
        };

        let mapped = map(&entity);
        if Rc::ptr_eq(&entity, &mapped) {
            return MutationResult::None;
        }

        self.update_one(
            Update {
                id: id.clone(),
                changes: Changes::Whole(mapped),
            },
            draft,
        )
    }

    /// Map every entity; only entities the map actually replaced are updated.
    fn map(&self, map: &EntityMap<'_, E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let updates: Vec<Update<E>> = draft
            .ids
            .iter()
            .filter_map(|id| {
                let entity = draft.entities.get(id)?;
                let mapped = map(entity);
                (!Rc::ptr_eq(entity, &mapped)).then(|| Update {
                    id: id.clone(),
                    changes: Changes::Whole(mapped),
                })
            })
            .collect();

        self.update_many(updates, draft)
    }
}
