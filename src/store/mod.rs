// ============================================================================
// spark-entities - Store Module
// Reactive entity store: state cell, selectors, updaters
// ============================================================================

pub mod config;
pub mod entity_store;
pub mod updaters;

pub use config::EntityStoreConfig;
pub use entity_store::{EntityStore, Patched};
pub use updaters::EntityUpdaters;
