//! Dispatch core: main-thread queue, background executor and callback adapters.

pub mod adapter;
pub mod context;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod global;
pub mod worker_pool;

pub use adapter::{Action, Callback, CallbackAdapter, NoNamedOutcome, Outcome, OutcomeCallbacks};
pub use context::DispatchContext;
pub use delivery::{deliver, DeliveryMode, LegacyMode};
pub use dispatcher::{DispatcherStats, Job, MainThreadDispatcher, TickReport};
pub use error::{AppResult, DispatchError};
pub use executor::BackgroundExecutor;
pub use worker_pool::{PoolStats, WorkerPool};
