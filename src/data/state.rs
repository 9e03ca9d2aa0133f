// ============================================================================
// spark-entities - Data State
// Pending-request flags next to an entity collection
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::entity::state::{EntityState, HasEntityState};

// =============================================================================
// PENDING STATUSES
// =============================================================================

/// One flag per data store operation, raised while a request is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStatuses {
    pub is_load_pending: bool,
    pub is_load_by_id_pending: bool,
    pub is_create_pending: bool,
    pub is_update_pending: bool,
    pub is_delete_pending: bool,
}

impl PendingStatuses {
    /// True while any request is in flight.
    pub fn any(&self) -> bool {
        self.is_load_pending
            || self.is_load_by_id_pending
            || self.is_create_pending
            || self.is_update_pending
            || self.is_delete_pending
    }
}

/// States a `DataStore` can keep pending flags in.
pub trait HasPendingStatuses {
    fn pending_statuses(&self) -> &PendingStatuses;

    fn pending_statuses_mut(&mut self) -> &mut PendingStatuses;
}

impl HasPendingStatuses for PendingStatuses {
    fn pending_statuses(&self) -> &PendingStatuses {
        self
    }

    fn pending_statuses_mut(&mut self) -> &mut PendingStatuses {
        self
    }
}

// =============================================================================
// DATA STATE
// =============================================================================

/// Entity collection plus pending flags, for stores with no other state.
///
/// Serializes flat: `{ "ids", "entities", "isLoadPending", ... }`.
#[derive(Serialize)]
pub struct DataState<E> {
    #[serde(flatten)]
    pub entities: EntityState<E>,
    #[serde(flatten)]
    pub pending: PendingStatuses,
}

impl<E> DataState<E> {
    /// Empty collection, nothing pending.
    pub fn initial() -> Self {
        Self {
            entities: EntityState::initial(),
            pending: PendingStatuses::default(),
        }
    }
}

impl<E> Default for DataState<E> {
    fn default() -> Self {
        Self::initial()
    }
}

impl<E> Clone for DataState<E> {
    fn clone(&self) -> Self {
        Self {
            entities: self.entities.clone(),
            pending: self.pending,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for DataState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataState")
            .field("entities", &self.entities)
            .field("pending", &self.pending)
            .finish()
    }
}

impl<E> HasEntityState<E> for DataState<E> {
    fn entity_state(&self) -> &EntityState<E> {
        &self.entities
    }

    fn entity_state_mut(&mut self) -> &mut EntityState<E> {
        &mut self.entities
    }
}

impl<E> HasPendingStatuses for DataState<E> {
    fn pending_statuses(&self) -> &PendingStatuses {
        &self.pending
    }

    fn pending_statuses_mut(&mut self) -> &mut PendingStatuses {
        &mut self.pending
    }
}

// =============================================================================
// TESTS
// =============================================================================
