// ============================================================================
// spark-entities - Entity Module
// Normalized entity collections and the adapters that transform them
// ============================================================================

pub mod adapter;
pub mod id;
pub mod model;
pub mod record;
pub mod state;

mod mutator;
mod operator;
mod sorted;
mod unsorted;

pub use adapter::{create_entity_adapter, EntityAdapter, EntityAdapterConfig};
pub use id::{select_id_value, Id, Identified, SelectId, UNDEFINED_ID};
pub use model::{sort_comparer, Changes, Entity, MutationResult, SortComparer, Update};
pub use record::Record;
pub use state::{EntityMapping, EntityState, HasEntityState};
