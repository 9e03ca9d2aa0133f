// ============================================================================
// spark-entities - Data Module
// Entity stores synchronized through a data service
// ============================================================================

pub mod effects;
pub mod service;
pub mod state;
pub mod store;

pub use effects::DataEffects;
pub use service::{DataService, DeleteResponse, LoadResponse, QueryParams, QueryValue};
pub use state::{DataState, HasPendingStatuses, PendingStatuses};
pub use store::{DataStore, DataStoreConfig};
