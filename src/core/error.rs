//! Error types for dispatch operations.

use thiserror::Error;

/// Errors produced by dispatch components.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The background executor has been shut down.
    #[error("background pool has been shut down")]
    PoolShutdown,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
    /// The legacy callback flag was written after it had been read.
    #[error("legacy callback mode is sealed after the first asynchronous call")]
    LegacyModeSealed,
    /// The process-wide context was initialized twice.
    #[error("dispatch context already initialized")]
    AlreadyInitialized,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
