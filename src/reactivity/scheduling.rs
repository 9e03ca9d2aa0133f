// ============================================================================
// spark-entities - Notification Scheduling
// Queues change notifications and delivers them synchronously
// ============================================================================
//
// Every notification goes through one thread-local FIFO queue:
//
// - outside a batch, scheduling flushes the queue right away
// - inside a batch, jobs wait until the outermost batch exits
// - while the queue is flushing, new jobs are appended and run after the
//   job that scheduled them, never nested inside it
//
// The last rule gives sequential consistency: a write made from a subscriber
// is seen by every subscriber only after the current notification finished.
// ============================================================================

use crate::core::context::{with_context, Job};

/// Maximum jobs per flush before we consider it an infinite loop
const MAX_FLUSH_COUNT: u32 = 10_000;

// =============================================================================
// SCHEDULE
// =============================================================================

/// Queue a notification job, flushing unless batching or already flushing.
pub fn schedule(job: Job) {
    let should_flush = with_context(|ctx| {
        ctx.push_job(job);
        !ctx.is_batching() && !ctx.is_flushing()
    });

    if should_flush {
        flush_sync();
    }
}

// =============================================================================
// FLUSH SYNC
// =============================================================================

/// Run queued notification jobs until the queue is empty.
///
/// A no-op when called while a flush is already running further up the stack.
pub fn flush_sync() {
    let was_flushing = with_context(|ctx| ctx.set_flushing(true));
    if was_flushing {
        return;
    }

    // Restore the flag even if a subscriber panics.
    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing(false));
        }
    }

    let _guard = FlushGuard;
    let mut flush_count = 0u32;

    while let Some(job) = with_context(|ctx| ctx.pop_job()) {
        flush_count += 1;
        if flush_count > MAX_FLUSH_COUNT {
            let dropped = with_context(|ctx| ctx.clear_jobs());
            tracing::error!(
                dropped = dropped + 1,
                "maximum update depth exceeded; a subscriber keeps writing to a cell it observes"
            );
            break;
        }
        job();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn schedule_outside_batch_runs_immediately() {
        let ran = Rc::new(Cell::new(false));
        schedule(Box::new({
            let ran = ran.clone();
            move || ran.set(true)
        }));
        assert!(ran.get());
    }

    #[test]
    fn nested_schedule_runs_after_current_job() {
        let log = Rc::new(RefCell::new(Vec::new()));

        schedule(Box::new({
            let log = log.clone();
            move || {
                log.borrow_mut().push("outer start");
                schedule(Box::new({
                    let log = log.clone();
                    move || log.borrow_mut().push("inner")
                }));
                log.borrow_mut().push("outer end");
            }
        }));

        assert_eq!(*log.borrow(), vec!["outer start", "outer end", "inner"]);
    }

    #[test]
    fn runaway_jobs_are_cut_off() {
        fn again(count: Rc<Cell<u32>>) {
            schedule(Box::new(move || {
                count.set(count.get() + 1);
                again(count.clone());
            }));
        }

        let count = Rc::new(Cell::new(0));
        again(count.clone());
        assert_eq!(count.get(), MAX_FLUSH_COUNT);
        assert_eq!(with_context(|ctx| ctx.pending_job_count()), 0);
    }
}
