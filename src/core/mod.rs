// ============================================================================
// spark-entities - Core Module
// Fundamental types, traits, and context for the reactive layer
// ============================================================================

pub mod context;
pub mod types;

pub use context::{with_context, Job, ReactiveContext};
pub use types::{AnyReadable, EqualsFn, Listener, Listeners};
