// ============================================================================
// spark-entities - Unsorted Adapter
// Structural operations for collections kept in insertion order
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::id::{Id, SelectId, select_id_value};
use super::model::{Entity, MutationResult, Update};
use super::mutator::StateMutator;
use super::state::EntityDraft;

/// Keeps `ids` in insertion order. Existing ids are never reordered.
pub(crate) struct UnsortedAdapter<E> {
    select_id: SelectId<E>,
}

impl<E: Entity> UnsortedAdapter<E> {
    pub(crate) fn new(select_id: SelectId<E>) -> Self {
        Self { select_id }
    }

    fn insert_new(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let id = select_id_value(&*entity, &self.select_id);
        if draft.contains(&id) {
            return MutationResult::None;
        }

        draft.ids.push(id.clone());
        draft.entities.insert(id, entity);
        MutationResult::Both
    }
}

impl<E: Entity> StateMutator<E> for UnsortedAdapter<E> {
    fn select_id(&self) -> &SelectId<E> {
        &self.select_id
    }

    fn add_many(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        MutationResult::combine_all(
            entities
                .into_iter()
                .map(|entity| self.insert_new(entity, draft)),
        )
    }

    fn set_one(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let id = select_id_value(&*entity, &self.select_id);
        if draft.contains(&id) {
            draft.entities.insert(id, entity);
            return MutationResult::EntitiesOnly;
        }

        draft.ids.push(id.clone());
        draft.entities.insert(id, entity);
        MutationResult::Both
    }

    fn remove_many(&self, ids: &[Id], draft: &mut EntityDraft<E>) -> MutationResult {
        let mut removed = false;
        for id in ids {
            removed |= draft.entities.remove(id).is_some();
        }

        if !removed {
            return MutationResult::None;
        }

        let entities = &draft.entities;
        draft.ids.retain(|id| entities.contains_key(id));
        MutationResult::Both
    }

    fn update_many(&self, updates: Vec<Update<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        // original id -> id the entity now lives under
        let mut remapped: HashMap<Id, Id> = HashMap::new();
        let mut matched = false;

        for update in updates {
            let Some(original) = draft.entities.get(&update.id).cloned() else {
                continue;
            };
            matched = true;

            let updated = update.changes.merge_onto(&original);
            let new_id = select_id_value(&*updated, &self.select_id);

            if new_id != update.id {
                draft.entities.remove(&update.id);

                let mut moved_here = false;
                for target in remapped.values_mut() {
                    if *target == update.id {
                        *target = new_id.clone();
                        moved_here = true;
                    }
                }
                if !moved_here {
                    remapped.insert(update.id.clone(), new_id.clone());
                }
            }

            draft.entities.insert(new_id, updated);
        }

        if !matched {
            return MutationResult::None;
        }
        if remapped.is_empty() {
            return MutationResult::EntitiesOnly;
        }

        let mut seen = HashSet::with_capacity(draft.ids.len());
        let entities = &draft.entities;
        let ids = std::mem::take(&mut draft.ids);
        draft.ids = ids
            .into_iter()
            .map(|id| remapped.get(&id).cloned().unwrap_or(id))
            .filter(|id| entities.contains_key(id) && seen.insert(id.clone()))
            .collect();

        MutationResult::Both
    }
}

// =============================================================================
// TESTS
// =============================================================================
