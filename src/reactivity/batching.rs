// ============================================================================
// spark-entities - Batching
// Group multiple writes into a single notification pass
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_sync;

// =============================================================================
// BATCH
// =============================================================================

/// Batch multiple cell writes into a single notification pass.
///
/// Without batching, each write notifies subscribers immediately. With
/// batching, each written cell notifies once, with its final value, after the
/// outermost batch returns.
///
/// # Example
///
/// ```
/// use spark_entities::{batch, StateCell};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = StateCell::new(0);
/// let seen = Rc::new(Cell::new(0));
///
/// let _sub = count.subscribe({
///     let seen = seen.clone();
///     move |_| seen.set(seen.get() + 1)
/// });
/// assert_eq!(seen.get(), 1); // replay of the current value
///
/// batch(|| {
///     count.set(1);
///     count.set(2);
/// });
///
/// assert_eq!(seen.get(), 2);
/// assert_eq!(count.get(), Some(2));
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_context(|ctx| ctx.enter_batch());

    // Exit the batch even on panic
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let depth = with_context(|ctx| ctx.exit_batch());

            if depth == 0 {
                flush_sync();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Check if currently inside a batch.
///
/// # Example
///
/// ```
/// use spark_entities::{batch, is_batching};
///
/// assert!(!is_batching());
///
/// batch(|| {
///     assert!(is_batching());
/// });
///
/// assert!(!is_batching());
/// ```
pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_batching())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::scheduling::schedule;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn batch_defers_jobs_until_outermost_exit() {
        let runs = Rc::new(Cell::new(0));

        batch(|| {
            schedule(Box::new({
                let runs = runs.clone();
                move || runs.set(runs.get() + 1)
            }));

            batch(|| {
                schedule(Box::new({
                    let runs = runs.clone();
                    move || runs.set(runs.get() + 1)
                }));
            });

            assert_eq!(runs.get(), 0);
        });

        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn batch_returns_value() {
        assert_eq!(batch(|| 42), 42);
    }

    #[test]
    fn batch_depth_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            batch(|| panic!("boom"));
        });
        assert!(result.is_err());
        assert!(!is_batching());
    }
}
