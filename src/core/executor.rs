//! Background execution abstraction used by `run_async`.

use super::{DispatchError, Job};

/// Runs fire-and-forget work off the caller's thread.
///
/// Implementations must not block the submitting thread and give no ordering
/// guarantee between submissions. Panics inside a job are the executor's to
/// contain; they are never reported back to the submitter.
///
/// # Example
///
/// ```rust
/// use playtime_bridge::core::{BackgroundExecutor, DispatchError, Job};
///
/// /// Runs every job inline; handy in single-threaded tests.
/// struct Inline;
///
/// impl BackgroundExecutor for Inline {
///     fn execute(&self, job: Job) -> Result<(), DispatchError> {
///         job();
///         Ok(())
///     }
/// }
///
/// Inline.execute(Box::new(|| println!("ran"))).unwrap();
/// ```
pub trait BackgroundExecutor: Send + Sync + 'static {
    /// Submit `job` for execution.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::PoolShutdown` once the executor has been shut down.
    fn execute(&self, job: Job) -> Result<(), DispatchError>;

    /// Stop accepting work and release threads. Default: no-op.
    fn shutdown(&self) {}
}
