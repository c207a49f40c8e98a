//! Process-wide dispatch context.
//!
//! Hosts that cannot thread a [`DispatchContext`] through their code use this
//! module instead: [`init`] at startup (or let [`context`] create one lazily
//! from the environment), [`tick`] from the main loop, [`teardown`] on exit.

use parking_lot::RwLock;
use tracing::info;

use crate::config::DispatchConfig;

use super::{BackgroundExecutor, DispatchContext, DispatchError, TickReport};

static GLOBAL: RwLock<Option<DispatchContext>> = parking_lot::const_rwlock(None);

/// Create the process-wide context from `config`.
///
/// # Errors
///
/// Returns `DispatchError::AlreadyInitialized` if a context exists, or any
/// error from [`DispatchContext::new`].
pub fn init(config: DispatchConfig) -> Result<DispatchContext, DispatchError> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(DispatchError::AlreadyInitialized);
    }
    let ctx = DispatchContext::new(config)?;
    *slot = Some(ctx.clone());
    info!("process-wide dispatch context initialized");
    Ok(ctx)
}

/// Install an externally built context as the process-wide one.
///
/// # Errors
///
/// Returns `DispatchError::AlreadyInitialized` if a context exists.
pub fn install(ctx: DispatchContext) -> Result<(), DispatchError> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(DispatchError::AlreadyInitialized);
    }
    *slot = Some(ctx);
    info!("process-wide dispatch context installed");
    Ok(())
}

/// The process-wide context, created from [`DispatchConfig::from_env`] on
/// first use.
///
/// # Errors
///
/// Returns `DispatchError::InvalidConfig` if the environment holds an invalid
/// configuration, or `DispatchError::ThreadSpawn` if workers cannot start.
pub fn context() -> Result<DispatchContext, DispatchError> {
    if let Some(ctx) = GLOBAL.read().as_ref() {
        return Ok(ctx.clone());
    }
    let mut slot = GLOBAL.write();
    // Another thread may have won the race for the write lock.
    if let Some(ctx) = slot.as_ref() {
        return Ok(ctx.clone());
    }
    let config = DispatchConfig::from_env().map_err(DispatchError::InvalidConfig)?;
    let ctx = DispatchContext::new(config)?;
    *slot = Some(ctx.clone());
    info!("process-wide dispatch context created lazily");
    Ok(ctx)
}

/// The process-wide context if one exists.
#[must_use]
pub fn try_context() -> Option<DispatchContext> {
    GLOBAL.read().clone()
}

/// Drain the process-wide main-thread queue. No-op before initialization.
pub fn tick() -> TickReport {
    try_context().map(|ctx| ctx.tick()).unwrap_or_default()
}

/// Remove and shut down the process-wide context. Returns `false` if none
/// existed.
pub fn teardown() -> bool {
    let Some(ctx) = GLOBAL.write().take() else {
        return false;
    };
    ctx.shutdown();
    info!("process-wide dispatch context torn down");
    true
}

/// Build the process-wide context around a custom background executor.
///
/// # Errors
///
/// Returns `DispatchError::AlreadyInitialized` if a context exists, or
/// `DispatchError::InvalidConfig` for an invalid configuration.
pub fn init_with_executor<X>(config: DispatchConfig, executor: X) -> Result<DispatchContext, DispatchError>
where
    X: BackgroundExecutor,
{
    let ctx = DispatchContext::with_executor(config, executor)?;
    install(ctx.clone())?;
    Ok(ctx)
}
