// ============================================================================
// spark-entities - Reactive Context
// Thread-local state for batching and notification delivery
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A queued notification, run once by the flush loop.
pub type Job = Box<dyn FnOnce()>;

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding all global state for notification.
pub struct ReactiveContext {
    // =========================================================================
    // VERSION COUNTERS
    // =========================================================================
    /// Global write version - incremented on every cell write
    pub write_version: Cell<u64>,

    // =========================================================================
    // BATCHING
    // =========================================================================
    /// Current batch depth (for nested batches)
    pub batch_depth: Cell<u32>,

    /// Notifications waiting for the flush loop, in write order
    pub pending_jobs: RefCell<VecDeque<Job>>,

    /// Whether the flush loop is currently running
    pub is_flushing: Cell<bool>,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            write_version: Cell::new(0),
            batch_depth: Cell::new(0),
            pending_jobs: RefCell::new(VecDeque::new()),
            is_flushing: Cell::new(false),
        }
    }

    // =========================================================================
    // VERSION COUNTERS
    // =========================================================================

    /// Increment and return the write version
    pub fn increment_write_version(&self) -> u64 {
        let v = self.write_version.get() + 1;
        self.write_version.set(v);
        v
    }

    pub fn get_write_version(&self) -> u64 {
        self.write_version.get()
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Increment batch depth, returns new depth
    pub fn enter_batch(&self) -> u32 {
        let depth = self.batch_depth.get() + 1;
        self.batch_depth.set(depth);
        depth
    }

    /// Decrement batch depth, returns new depth
    pub fn exit_batch(&self) -> u32 {
        let depth = self.batch_depth.get().saturating_sub(1);
        self.batch_depth.set(depth);
        depth
    }

    pub fn get_batch_depth(&self) -> u32 {
        self.batch_depth.get()
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    pub fn push_job(&self, job: Job) {
        self.pending_jobs.borrow_mut().push_back(job);
    }

    /// Pop the oldest pending job
    pub fn pop_job(&self) -> Option<Job> {
        self.pending_jobs.borrow_mut().pop_front()
    }

    pub fn pending_job_count(&self) -> usize {
        self.pending_jobs.borrow().len()
    }

    /// Drop every pending job, returning how many were dropped
    pub fn clear_jobs(&self) -> usize {
        let dropped = std::mem::take(&mut *self.pending_jobs.borrow_mut());
        dropped.len()
    }

    /// Set flushing mode, returning previous
    pub fn set_flushing(&self, value: bool) -> bool {
        self.is_flushing.replace(value)
    }

    pub fn is_flushing(&self) -> bool {
        self.is_flushing.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
///
/// Never run user callbacks inside `f`; take what you need out and release the
/// context first.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// TESTS
// =============================================================================
