// ============================================================================
// spark-entities - Reactive Entity Collections for Rust
// ============================================================================
//
// Layers, bottom up:
//
//   entity      normalized collections and pure adapters (no reactivity)
//   reactivity  notification queue, batching, equality functions
//   primitives  state cell, selector, subscription
//   store       entity store: cell + adapter + memoized selectors
//   data        entity store synchronized through a data service
// ============================================================================

pub mod core;
pub mod data;
pub mod entity;
pub mod error;
pub mod primitives;
pub mod reactivity;
pub mod store;

// Entity collections and adapters
pub use entity::{
    create_entity_adapter, select_id_value, sort_comparer, Changes, Entity, EntityAdapter,
    EntityAdapterConfig, EntityMapping, EntityState, HasEntityState, Id, Identified,
    MutationResult, Record, SelectId, SortComparer, Update, UNDEFINED_ID,
};

// Reactive facade
pub use core::types::EqualsFn;
pub use primitives::{Selector, StateCell, Subscription};
pub use reactivity::batching::{batch, is_batching};
pub use reactivity::equality::{
    always_equals, equals, never_equals, ptr_equals_slice, rc_ptr_equals, shallow_equals_slice,
};
pub use reactivity::scheduling::flush_sync;

// Stores
pub use data::{
    DataEffects, DataService, DataState, DataStore, DataStoreConfig, DeleteResponse,
    HasPendingStatuses, LoadResponse, PendingStatuses, QueryParams, QueryValue,
};
pub use store::{EntityStore, EntityStoreConfig, EntityUpdaters, Patched};

// Errors
pub use error::{DataError, StateError, StoreError};
