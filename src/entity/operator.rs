// ============================================================================
// spark-entities - State Operator
// Turns an in-place draft mutator into an immutable state transition
// ============================================================================
//
// The mutator reports what it touched and the wrapper copies only that much:
//
// - None:          the state comes back as it went in (buffers still shared)
// - EntitiesOnly:  new dictionary, original `ids` buffer
// - Both:          new dictionary and new `ids`
//
// Consumers memoize on the `ids` buffer, so it must never be replaced unless
// the order really changed.
// ============================================================================

use std::rc::Rc;

use super::model::MutationResult;
use super::state::{EntityDraft, EntityState, HasEntityState};

/// Run `mutator` on a draft of the state's collection and freeze the result.
pub(crate) fn operate<S, E, F>(mut state: S, mutator: F) -> S
where
    S: HasEntityState<E>,
    F: FnOnce(&mut EntityDraft<E>) -> MutationResult,
{
    let current = state.entity_state();
    let mut draft = current.draft();
    let result = mutator(&mut draft);

    tracing::trace!(?result, total = draft.ids.len(), "entity state mutation");

    if !result.changed() {
        return state;
    }

    let ids = if result.ids_changed() {
        Rc::new(draft.ids)
    } else {
        current.ids_rc().clone()
    };

    *state.entity_state_mut() = EntityState::from_shared(ids, Rc::new(draft.entities));
    state
}

// =============================================================================
// TESTS
// =============================================================================
