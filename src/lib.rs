//! # Playtime Bridge
//!
//! Cross-thread callback dispatch for hosts embedding the Playtime rewards
//! service.
//!
//! The service completes requests on its own worker threads, but host code
//! (a game's update loop, a UI thread) usually may only be touched from one
//! designated main thread. This crate sits between the two: every asynchronous
//! call carries a per-call [`CallbackAdapter`](core::CallbackAdapter) that
//! turns the service's outcome into a work item, and a
//! [`MainThreadDispatcher`](core::MainThreadDispatcher) runs those work items
//! when the host ticks it once per frame.
//!
//! ## Key Features
//!
//! - **Double-buffered main-thread queue**: producers never wait for callbacks
//!   to finish; the lock only covers a push or a swap
//! - **Idle fast path**: a tick with nothing pending touches one atomic flag
//! - **Fault isolation**: a panicking callback is logged and the rest of the
//!   frame's callbacks still run
//! - **Legacy mode**: optionally deliver callbacks on the reporting thread,
//!   fixed before the first call
//! - **Background pool**: fire-and-forget `run_async` on dedicated OS threads
//!   or a tokio blocking pool
//!
//! ## Example
//!
//! ```rust
//! use playtime_bridge::config::DispatchConfig;
//! use playtime_bridge::core::{DispatchContext, OutcomeCallbacks};
//!
//! let ctx = DispatchContext::new(DispatchConfig::new().with_worker_count(2)).unwrap();
//!
//! // Work queued from a background thread...
//! let main = ctx.clone();
//! std::thread::spawn(move || main.run_on_main_thread(|| println!("on the main thread")))
//!     .join()
//!     .unwrap();
//!
//! // ...runs when the host ticks.
//! assert_eq!(ctx.tick().executed, 1);
//! ctx.shutdown();
//! ```
//!
//! For complete examples, see:
//! - `tests/dispatch_test.rs` - ordering and threading guarantees
//! - `tests/client_test.rs` - the client over a threaded fake transport

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Dispatch core: main-thread queue, background pool, callback adapters.
pub mod core;
/// Configuration models for the dispatcher and background pool.
pub mod config;
/// Runtime adapters for background execution.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Rewards service surface built on the dispatch core.
pub mod sdk;
/// Shared utilities.
pub mod util;
