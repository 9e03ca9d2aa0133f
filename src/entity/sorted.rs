// ============================================================================
// spark-entities - Sorted Adapter
// Structural operations for collections kept in comparator order
// ============================================================================
//
// New or changed entities are never sorted into the collection one by one.
// They are sorted among themselves and then merged against the existing,
// already ordered ids in a single linear pass:
//
//   O(m log m + n)  for m incoming entities and n existing ids
//
// On ties the incoming entity goes first. Existing ids keep their relative
// order because they are only ever copied across in sequence.
// ============================================================================

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::id::{Id, SelectId, select_id_value};
use super::model::{Entity, MutationResult, SortComparer, Update};
use super::mutator::StateMutator;
use super::state::EntityDraft;
use super::unsorted::UnsortedAdapter;

/// Keeps `ids` ordered by a caller-supplied comparator.
pub(crate) struct SortedAdapter<E> {
    select_id: SelectId<E>,
    sort_comparer: SortComparer<E>,
    // Removal never needs reordering, so it is delegated.
    unsorted: UnsortedAdapter<E>,
}

impl<E: Entity> SortedAdapter<E> {
    pub(crate) fn new(select_id: SelectId<E>, sort_comparer: SortComparer<E>) -> Self {
        Self {
            unsorted: UnsortedAdapter::new(select_id.clone()),
            select_id,
            sort_comparer,
        }
    }

    /// Merge entities whose ids are not in `draft.ids` into the order.
    fn merge(&self, mut models: Vec<(Id, Rc<E>)>, draft: &mut EntityDraft<E>) {
        models.sort_by(|(_, a), (_, b)| (self.sort_comparer)(a, b));

        let existing = std::mem::take(&mut draft.ids);
        let mut ids = Vec::with_capacity(existing.len() + models.len());

        let mut i = 0;
        let mut j = 0;
        while i < models.len() && j < existing.len() {
            let Some(entity) = draft.entities.get(&existing[j]) else {
                j += 1;
                continue;
            };

            let (model_id, model) = &models[i];
            if (self.sort_comparer)(model, entity) != Ordering::Greater {
                ids.push(model_id.clone());
                i += 1;
            } else {
                ids.push(existing[j].clone());
                j += 1;
            }
        }

        ids.extend(models[i..].iter().map(|(id, _)| id.clone()));
        ids.extend(
            existing[j..]
                .iter()
                .filter(|id| draft.entities.contains_key(*id))
                .cloned(),
        );

        draft.ids = ids;
        draft.entities.extend(models);
    }
}

impl<E: Entity> StateMutator<E> for SortedAdapter<E> {
    fn select_id(&self) -> &SelectId<E> {
        &self.select_id
    }

    fn add_many(&self, entities: Vec<Rc<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        let mut seen = HashSet::new();
        let models: Vec<(Id, Rc<E>)> = entities
            .into_iter()
            .filter_map(|entity| {
                let id = select_id_value(&*entity, &self.select_id);
                (!draft.contains(&id) && seen.insert(id.clone())).then_some((id, entity))
            })
            .collect();

        if models.is_empty() {
            return MutationResult::None;
        }

        self.merge(models, draft);
        MutationResult::Both
    }

    fn set_one(&self, entity: Rc<E>, draft: &mut EntityDraft<E>) -> MutationResult {
        let id = select_id_value(&*entity, &self.select_id);
        if !draft.contains(&id) {
            return self.add_one(entity, draft);
        }

        // The replacement may sort differently, so take it out and merge it back.
        draft.ids.retain(|existing| *existing != id);
        self.merge(vec![(id, entity)], draft);
        MutationResult::Both
    }

    fn remove_many(&self, ids: &[Id], draft: &mut EntityDraft<E>) -> MutationResult {
        self.unsorted.remove_many(ids, draft)
    }

    fn update_many(&self, updates: Vec<Update<E>>, draft: &mut EntityDraft<E>) -> MutationResult {
        // Updated entities leave the dictionary and wait here, keyed by the id
        // they will be stored under, until they are merged back.
        let mut models: Vec<Option<(Id, Rc<E>)>> = Vec::new();
        let mut pending: HashMap<Id, usize> = HashMap::new();

        for update in updates {
            let (original, slot) = if let Some(entity) = draft.entities.remove(&update.id) {
                (entity, None)
            } else if let Some(index) = pending.remove(&update.id) {
                match models[index].take() {
                    Some((_, entity)) => (entity, Some(index)),
                    None => continue,
                }
            } else {
                continue;
            };

            let updated = update.changes.merge_onto(&original);
            let new_id = select_id_value(&*updated, &self.select_id);

            // Another entity already lives under the new id: the update wins.
            draft.entities.remove(&new_id);
            if let Some(other) = pending.remove(&new_id) {
                models[other] = None;
            }

            let index = match slot {
                Some(index) => index,
                None => {
                    models.push(None);
                    models.len() - 1
                }
            };
            models[index] = Some((new_id.clone(), updated));
            pending.insert(new_id, index);
        }

        let models: Vec<(Id, Rc<E>)> = models.into_iter().flatten().collect();
        if models.is_empty() {
            return MutationResult::None;
        }

        let original_ids = draft.ids.clone();
        let entities = &draft.entities;
        draft.ids.retain(|id| entities.contains_key(id));

        self.merge(models, draft);

        if draft.ids == original_ids {
            MutationResult::EntitiesOnly
        } else {
            MutationResult::Both
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::state::EntityState;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Book {
        id: i64,
        title: String,
    }

    #[derive(Debug, Default)]
    struct BookChanges {
        id: Option<i64>,
        title: Option<String>,
    }

    impl Entity for Book {
        type Changes = BookChanges;

        fn apply(&self, changes: &BookChanges) -> Self {
            Book {
                id: changes.id.unwrap_or(self.id),
                title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            }
        }
    }

    fn book(id: i64, title: &str) -> Rc<Book> {
        Rc::new(Book {
            id,
            title: title.into(),
        })
    }

    fn adapter() -> SortedAdapter<Book> {
        SortedAdapter::new(
            SelectId::new(|b: &Book| Some(Id::from(b.id))),
            Rc::new(|a: &Book, b: &Book| a.title.cmp(&b.title)),
        )
    }

    fn draft_with(books: Vec<Rc<Book>>) -> EntityDraft<Book> {
        let mut draft: EntityDraft<Book> = EntityState::new().draft();
        adapter().add_many(books, &mut draft);
        draft
    }

    fn ids(draft: &EntityDraft<Book>) -> Vec<i64> {
        draft.ids.iter().filter_map(Id::as_num).collect()
    }

    fn retitle(id: i64, title: &str) -> Update<Book> {
        Update::new(
            id,
            BookChanges {
                title: Some(title.into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn add_merges_into_order() {
        let mut draft = draft_with(vec![book(1, "b"), book(2, "n")]);
        let result = adapter().add_one(book(3, "m"), &mut draft);
        assert_eq!(result, MutationResult::Both);
        assert_eq!(ids(&draft), [1, 3, 2]);
    }

    #[test]
    fn add_many_sorts_the_batch_first() {
        let mut draft = draft_with(vec![book(1, "d"), book(2, "h")]);
        adapter().add_many(vec![book(5, "z"), book(3, "a"), book(4, "e")], &mut draft);
        assert_eq!(ids(&draft), [3, 1, 4, 2, 5]);
    }

    #[test]
    fn ties_put_incoming_first() {
        let mut draft = draft_with(vec![book(1, "same")]);
        adapter().add_one(book(2, "same"), &mut draft);
        assert_eq!(ids(&draft), [2, 1]);
    }

    #[test]
    fn add_skips_existing_and_duplicate_ids() {
        let mut draft = draft_with(vec![book(1, "b")]);
        let result = adapter().add_many(vec![book(1, "a"), book(2, "c"), book(2, "d")], &mut draft);
        assert_eq!(result, MutationResult::Both);
        assert_eq!(ids(&draft), [1, 2]);
        assert_eq!(draft.entities[&Id::from(2)].title, "c");

        let again = adapter().add_one(book(1, "x"), &mut draft);
        assert_eq!(again, MutationResult::None);
    }

    #[test]
    fn set_one_repositions_existing_entity() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b"), book(3, "c")]);
        let result = adapter().set_one(book(1, "z"), &mut draft);
        assert_eq!(result, MutationResult::Both);
        assert_eq!(ids(&draft), [2, 3, 1]);
        assert_eq!(draft.entities[&Id::from(1)].title, "z");
    }

    #[test]
    fn set_one_of_new_entity_adds_it() {
        let mut draft = draft_with(vec![book(1, "a")]);
        assert_eq!(adapter().set_one(book(2, "0"), &mut draft), MutationResult::Both);
        assert_eq!(ids(&draft), [2, 1]);
    }

    #[test]
    fn remove_is_delegated() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b"), book(3, "c")]);
        assert_eq!(
            adapter().remove_many(&[Id::from(2)], &mut draft),
            MutationResult::Both
        );
        assert_eq!(ids(&draft), [1, 3]);
    }

    #[test]
    fn update_that_moves_entity_reports_both() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b"), book(3, "c")]);
        let result = adapter().update_one(retitle(1, "d"), &mut draft);
        assert_eq!(result, MutationResult::Both);
        assert_eq!(ids(&draft), [2, 3, 1]);
    }

    #[test]
    fn update_that_keeps_order_reports_entities_only() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "c"), book(3, "e")]);
        let result = adapter().update_one(retitle(2, "d"), &mut draft);
        assert_eq!(result, MutationResult::EntitiesOnly);
        assert_eq!(ids(&draft), [1, 2, 3]);
        assert_eq!(draft.entities[&Id::from(2)].title, "d");
    }

    #[test]
    fn update_of_unknown_id_is_none() {
        let mut draft = draft_with(vec![book(1, "a")]);
        assert_eq!(
            adapter().update_one(retitle(9, "b"), &mut draft),
            MutationResult::None
        );
    }

    #[test]
    fn rekey_update_is_merged_under_new_id() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b")]);
        let update = Update::new(
            1,
            BookChanges {
                id: Some(7),
                ..Default::default()
            },
        );
        assert_eq!(adapter().update_one(update, &mut draft), MutationResult::Both);
        assert_eq!(ids(&draft), [7, 2]);
        assert!(!draft.contains(&Id::from(1)));
    }

    #[test]
    fn repeated_updates_of_one_id_accumulate() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b")]);
        let rekey = Update::new(
            1,
            BookChanges {
                id: Some(5),
                ..Default::default()
            },
        );
        adapter().update_many(vec![rekey, retitle(5, "c")], &mut draft);
        assert_eq!(ids(&draft), [2, 5]);
        assert_eq!(draft.entities[&Id::from(5)].title, "c");
        assert_eq!(draft.entities.len(), 2);
    }

    #[test]
    fn rekey_onto_existing_id_replaces_it() {
        let mut draft = draft_with(vec![book(1, "a"), book(2, "b"), book(3, "c")]);
        let update = Update::new(
            3,
            BookChanges {
                id: Some(1),
                ..Default::default()
            },
        );
        adapter().update_one(update, &mut draft);
        assert_eq!(ids(&draft), [2, 1]);
        assert_eq!(draft.entities[&Id::from(1)].title, "c");
    }

    #[test]
    fn upsert_and_map_keep_order() {
        let mut draft = draft_with(vec![book(1, "b"), book(2, "d")]);
        adapter().upsert_many(vec![book(1, "e"), book(3, "a")], &mut draft);
        assert_eq!(ids(&draft), [3, 2, 1]);

        let prefix = |b: &Rc<Book>| {
            if b.id == 2 {
                book(2, "z")
            } else {
                Rc::clone(b)
            }
        };
        assert_eq!(adapter().map(&prefix, &mut draft), MutationResult::Both);
        assert_eq!(ids(&draft), [3, 1, 2]);
    }

    #[test]
    fn identity_map_is_none() {
        let mut draft = draft_with(vec![book(1, "b"), book(2, "d")]);
        let identity = |b: &Rc<Book>| Rc::clone(b);
        assert_eq!(adapter().map(&identity, &mut draft), MutationResult::None);
    }
}
