//! Main-thread dispatcher with a double-buffered work queue.
//!
//! Producers on any thread append work items to the *backlog*. Once per frame
//! the host calls [`MainThreadDispatcher::tick`], which swaps the backlog with
//! the (empty) running queue under the lock and then executes the swapped-out
//! items without holding it. Work submitted while a drain is in progress lands
//! in the fresh backlog and runs on the following tick.
//!
//! # Design Principles
//!
//! - **Idle fast path**: `tick` reads an atomic dirty flag and returns without
//!   locking when nothing is pending
//! - **Short critical sections**: the lock covers a `Vec::push` or a swap,
//!   never the execution of a work item
//! - **Fault isolation**: a panicking work item is logged and counted; the
//!   rest of the drain still runs

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

/// A zero-argument, fire-once unit of deferred execution.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a single [`MainThreadDispatcher::tick`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Work items executed during this tick, including failed ones.
    pub executed: usize,
    /// Work items that panicked during this tick.
    pub failed: usize,
}

impl TickReport {
    /// `true` if the tick ran no work.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.executed == 0
    }
}

/// Statistics about dispatcher activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Total work items submitted.
    pub submitted: u64,
    /// Total work items executed (successfully or not).
    pub executed: u64,
    /// Total work items that panicked.
    pub failed: u64,
    /// Ticks that found pending work and performed a drain.
    pub drains: u64,
}

#[derive(Debug, Default)]
struct DispatcherCounters {
    submitted: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
    drains: AtomicU64,
}

impl DispatcherCounters {
    fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
        }
    }
}

/// Queues work from any thread and runs it on the thread that calls
/// [`tick`](Self::tick).
pub struct MainThreadDispatcher {
    /// Queue accepting new submissions.
    backlog: Mutex<Vec<Job>>,
    /// Queue being drained. Only `tick` touches it; the mutex also keeps two
    /// drains from overlapping.
    running: Mutex<Vec<Job>>,
    /// Set when the backlog became non-empty since the last swap.
    dirty: AtomicBool,
    /// Thread of the first drain.
    main_thread: OnceLock<ThreadId>,
    counters: DispatcherCounters,
}

impl MainThreadDispatcher {
    /// Create a dispatcher whose queues are pre-sized to `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            backlog: Mutex::new(Vec::with_capacity(capacity)),
            running: Mutex::new(Vec::with_capacity(capacity)),
            dirty: AtomicBool::new(false),
            main_thread: OnceLock::new(),
            counters: DispatcherCounters::default(),
        }
    }

    /// Queue `work` for the next tick. Never blocks beyond a brief lock.
    pub fn run_on_main_thread<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(work));
    }

    /// Queue an already boxed work item.
    pub fn submit(&self, job: Job) {
        {
            let mut backlog = self.backlog.lock();
            backlog.push(job);
            self.dirty.store(true, Ordering::Release);
        }
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain pending work on the calling thread.
    ///
    /// Returns immediately, without touching any lock, when nothing is
    /// pending. Items queued during the drain run on the next tick.
    pub fn tick(&self) -> TickReport {
        if !self.dirty.load(Ordering::Acquire) {
            return TickReport::default();
        }

        // Re-entrant tick from inside a work item.
        let Some(mut running) = self.running.try_lock() else {
            warn!("tick called while a drain is in progress; skipping");
            return TickReport::default();
        };

        {
            let mut backlog = self.backlog.lock();
            std::mem::swap(&mut *backlog, &mut *running);
            self.dirty.store(false, Ordering::Release);
        }

        self.note_main_thread();
        self.counters.drains.fetch_add(1, Ordering::Relaxed);

        let mut report = TickReport::default();
        for job in running.drain(..) {
            report.executed += 1;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                report.failed += 1;
                error!(
                    panic = %panic_message(payload.as_ref()),
                    "main-thread work item panicked"
                );
            }
        }

        self.counters
            .executed
            .fetch_add(report.executed as u64, Ordering::Relaxed);
        self.counters
            .failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
        debug!(
            executed = report.executed,
            failed = report.failed,
            "main-thread queue drained"
        );
        report
    }

    /// `true` if work is waiting for the next tick.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Number of items waiting in the backlog.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.backlog.lock().len()
    }

    /// `true` if the caller is the thread that performed the first drain.
    #[must_use]
    pub fn is_main_thread(&self) -> bool {
        self.main_thread
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    /// Get current dispatcher statistics.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        self.counters.snapshot()
    }

    fn note_main_thread(&self) {
        let current = thread::current().id();
        let main = *self.main_thread.get_or_init(|| current);
        if main != current {
            warn!(
                main_thread = ?main,
                current_thread = ?current,
                "main-thread queue drained from a different thread"
            );
        }
    }
}

impl Default for MainThreadDispatcher {
    fn default() -> Self {
        Self::new(8)
    }
}

impl std::fmt::Debug for MainThreadDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadDispatcher")
            .field("dirty", &self.dirty.load(Ordering::Relaxed))
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
