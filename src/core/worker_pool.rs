//! Background worker pool with dedicated OS threads.
//!
//! Backs [`DispatchContext::run_async`](crate::core::DispatchContext::run_async).
//! Jobs are plain closures delivered over a `crossbeam-channel`; each worker
//! blocks on `recv` and exits when the sender is dropped.
//!
//! # Design Principles
//!
//! - **No polling**: workers sleep in `recv` until work arrives
//! - **Never blocks submitters**: the channel is unbounded
//! - **Worker survives panics**: a panicking job is logged and counted
//! - **Clean shutdown**: dropping the sender unblocks every worker

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;

use super::dispatcher::panic_message;
use super::{BackgroundExecutor, DispatchError, Job};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Jobs currently executing.
    pub active_tasks: u64,
    /// Jobs waiting in the channel.
    pub queued_tasks: u64,
    /// Jobs that returned normally.
    pub completed_tasks: u64,
    /// Jobs that panicked.
    pub failed_tasks: u64,
    /// Jobs accepted by `execute`.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
struct PoolCounters {
    active_tasks: AtomicU64,
    queued_tasks: AtomicU64,
    completed_tasks: AtomicU64,
    failed_tasks: AtomicU64,
    submitted_tasks: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-size pool of named worker threads for fire-and-forget jobs.
pub struct WorkerPool {
    /// Job sender. `None` once shut down.
    job_tx: Mutex<Option<Sender<Job>>>,
    counters: Arc<PoolCounters>,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawn `config.worker_count` worker threads.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidConfig` for an invalid configuration and
    /// `DispatchError::ThreadSpawn` if the OS refuses a thread.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        config.validate().map_err(DispatchError::InvalidConfig)?;

        let (job_tx, job_rx) = unbounded::<Job>();
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let spawned = spawn_worker(
                worker_id,
                job_rx.clone(),
                Arc::clone(&counters),
                &config.thread_name_prefix,
                config.thread_stack_size,
            );
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to spawn worker thread");
                    // Dropping the sender lets the already running workers exit.
                    drop(job_tx);
                    return Err(DispatchError::ThreadSpawn(e));
                }
            }
        }

        info!(worker_count = config.worker_count, "WorkerPool initialized");

        Ok(Self {
            job_tx: Mutex::new(Some(job_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
            worker_count: config.worker_count,
        })
    }

    /// Submit a closure for background execution.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::PoolShutdown` if the pool has been shut down.
    pub fn submit<F>(&self, work: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Box::new(work))
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.worker_count)
    }

    /// `true` once [`shutdown`](BackgroundExecutor::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl BackgroundExecutor for WorkerPool {
    fn execute(&self, job: Job) -> Result<(), DispatchError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(DispatchError::PoolShutdown);
        }

        let job_tx = self.job_tx.lock();
        let Some(tx) = job_tx.as_ref() else {
            return Err(DispatchError::PoolShutdown);
        };

        // Count before sending so a fast worker never decrements below zero.
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
            return Err(DispatchError::PoolShutdown);
        }
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        debug!("Job submitted to worker pool");
        Ok(())
    }

    /// Drop the sender and join workers, allowing each up to two seconds.
    /// Queued jobs still run before the workers exit.
    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");
        self.job_tx.lock().take();

        let mut workers = self.workers.lock();
        let worker_count = workers.len();
        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.thread().id() == thread::current().id() {
                warn!(worker_id = idx, "Shutdown called from a worker thread - detaching it");
                continue;
            }
            let (tx, rx) = crossbeam_channel::bounded(1);
            let joiner = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = joiner.join();
        }

        info!(worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal only; joining here could hang on a long job.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.job_tx.lock().take();
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("stats", &self.stats())
            .field("shutdown", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<Job>,
    counters: Arc<PoolCounters>,
    name_prefix: &str,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{name_prefix}-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id, "Worker thread started");

            // Exits when every sender is gone.
            while let Ok(job) = job_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                counters.active_tasks.fetch_add(1, Ordering::Relaxed);

                match panic::catch_unwind(AssertUnwindSafe(job)) {
                    Ok(()) => {
                        counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(payload) => {
                        counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                        error!(
                            worker_id,
                            panic = %panic_message(payload.as_ref()),
                            "Background job panicked"
                        );
                    }
                }

                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
            }

            debug!(worker_id, "Worker thread exiting");
        })
}
