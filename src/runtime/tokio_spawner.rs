//! Tokio runtime spawner implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::core::{BackgroundExecutor, DispatchError, Job};

/// Background executor that runs jobs on a tokio runtime's blocking pool.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
    closed: Arc<AtomicBool>,
}

impl TokioSpawner {
    /// Create a `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a `TokioSpawner` bound to the runtime of the calling task.
    ///
    /// Returns `None` outside a tokio runtime.
    #[must_use]
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl BackgroundExecutor for TokioSpawner {
    fn execute(&self, job: Job) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::PoolShutdown);
        }
        // Panics stay inside the JoinHandle, which is dropped here.
        drop(self.handle.spawn_blocking(job));
        debug!("Job submitted to tokio blocking pool");
        Ok(())
    }

    fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for TokioSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSpawner")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
