// ============================================================================
// spark-entities - Primitives Module
// Reactive primitives: state cell, selector, subscription
// ============================================================================

pub mod cell;
pub mod selector;
pub mod subscription;

pub use cell::StateCell;
pub use selector::Selector;
pub use subscription::Subscription;
