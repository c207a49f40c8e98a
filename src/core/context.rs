//! Dispatch context: the handle that owns the main-thread dispatcher, the
//! background executor and the legacy callback switch.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DispatchConfig;

use super::{
    BackgroundExecutor, CallbackAdapter, DeliveryMode, DispatchError, LegacyMode,
    MainThreadDispatcher, OutcomeCallbacks, TickReport, WorkerPool,
};

struct ContextInner {
    config: DispatchConfig,
    dispatcher: MainThreadDispatcher,
    executor: Arc<dyn BackgroundExecutor>,
    legacy: LegacyMode,
}

/// Cheaply clonable handle to one dispatcher instance.
///
/// The host creates one context at startup, calls [`tick`](Self::tick) once
/// per frame from its main loop and [`shutdown`](Self::shutdown) on exit.
/// Every clone refers to the same queues.
#[derive(Clone)]
pub struct DispatchContext {
    inner: Arc<ContextInner>,
}

impl DispatchContext {
    /// Create a context backed by a [`WorkerPool`].
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidConfig` for an invalid configuration and
    /// `DispatchError::ThreadSpawn` if worker threads cannot be started.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let pool = WorkerPool::new(&config)?;
        Self::with_executor(config, pool)
    }

    /// Create a context that runs `run_async` work on `executor`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidConfig` for an invalid configuration.
    pub fn with_executor<X>(config: DispatchConfig, executor: X) -> Result<Self, DispatchError>
    where
        X: BackgroundExecutor,
    {
        config.validate().map_err(DispatchError::InvalidConfig)?;
        info!(
            legacy_callbacks = config.legacy_callbacks,
            queue_capacity = config.initial_queue_capacity,
            "dispatch context created"
        );
        Ok(Self {
            inner: Arc::new(ContextInner {
                dispatcher: MainThreadDispatcher::new(config.initial_queue_capacity),
                executor: Arc::new(executor),
                legacy: LegacyMode::new(config.legacy_callbacks),
                config,
            }),
        })
    }

    /// Run `work` on the background executor without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::PoolShutdown` after [`shutdown`](Self::shutdown).
    pub fn run_async<F>(&self, work: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.executor.execute(Box::new(work))
    }

    /// Queue `work` for the next [`tick`](Self::tick).
    pub fn run_on_main_thread<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.dispatcher.run_on_main_thread(work);
    }

    /// Drain queued main-thread work. Call once per main-loop iteration.
    pub fn tick(&self) -> TickReport {
        self.inner.dispatcher.tick()
    }

    /// Choose between immediate (legacy) and main-thread delivery.
    ///
    /// Must be called before the first asynchronous call is issued.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::LegacyModeSealed` once an adapter has been
    /// created or an outcome delivered.
    pub fn set_use_legacy_callbacks(&self, legacy: bool) -> Result<(), DispatchError> {
        self.inner.legacy.set(legacy)?;
        debug!(legacy, "legacy callback mode set");
        Ok(())
    }

    /// Current delivery mode. Reading seals the legacy switch.
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.inner.legacy.get()
    }

    /// Build the adapter for one asynchronous call.
    pub fn adapter<T, E, N>(
        &self,
        operation: &'static str,
        callbacks: OutcomeCallbacks<T, E, N>,
    ) -> CallbackAdapter<T, E, N>
    where
        T: Send + 'static,
        E: Send + 'static,
        N: Copy + Eq + Hash + Debug + Send + 'static,
    {
        self.seal_delivery_mode();
        CallbackAdapter::new(self.clone(), operation, callbacks)
    }

    /// Freeze the legacy switch; called whenever a call is issued.
    pub(crate) fn seal_delivery_mode(&self) {
        self.inner.legacy.seal();
    }

    /// The main-thread dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &MainThreadDispatcher {
        &self.inner.dispatcher
    }

    /// Configuration this context was built from.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// `true` if both handles refer to the same context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stop the background executor. Main-thread work already queued still
    /// runs on later ticks.
    pub fn shutdown(&self) {
        self.inner.executor.shutdown();
        debug!(
            pending = self.inner.dispatcher.pending(),
            "dispatch context shut down"
        );
    }
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .field("legacy", &self.inner.legacy)
            .finish_non_exhaustive()
    }
}
