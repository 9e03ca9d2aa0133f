// ============================================================================
// spark-entities - Reactivity Module
// Notification scheduling, batching and change detection
// ============================================================================

pub mod batching;
pub mod equality;
pub mod scheduling;

pub use batching::{batch, is_batching};
pub use scheduling::{flush_sync, schedule};
