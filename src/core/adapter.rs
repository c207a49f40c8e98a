//! Per-call callback adapter.
//!
//! Every asynchronous entry point builds exactly one [`CallbackAdapter`] and
//! hands it to the remote service. The service, on whatever thread it likes,
//! reports a single [`Outcome`]; the adapter looks up the matching user
//! callback, binds the payload into a work item and delivers it through the
//! context's current [`DeliveryMode`](super::DeliveryMode).
//!
//! ```rust
//! use playtime_bridge::config::DispatchConfig;
//! use playtime_bridge::core::{DispatchContext, OutcomeCallbacks};
//!
//! let ctx = DispatchContext::new(DispatchConfig::new().with_worker_count(1)).unwrap();
//! let callbacks = OutcomeCallbacks::<u32, String>::new()
//!     .on_success(|coins| println!("paid out {coins}"))
//!     .on_error(|msg| eprintln!("payout failed: {msg}"));
//! let adapter = ctx.adapter("payout", callbacks);
//!
//! std::thread::spawn(move || adapter.on_success(10)).join().unwrap();
//! assert_eq!(ctx.tick().executed, 1);
//! # ctx.shutdown();
//! ```

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};
use uuid::Uuid;

use super::{deliver, DispatchContext, Job};

/// User callback taking an outcome payload.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// User callback for a payload-less named outcome.
pub type Action = Arc<dyn Fn() + Send + Sync>;

/// Tag type for calls without named alternative outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoNamedOutcome {}

/// Completion signal reported by the remote service for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E, N = NoNamedOutcome> {
    /// The call succeeded.
    Success(T),
    /// The call failed with a structured error payload.
    Error(E),
    /// The call finished in a named alternative state.
    Named(N),
}

impl<T, E, N> Outcome<T, E, N> {
    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::Named(_) => "named",
        }
    }
}

/// Optional user callbacks for each outcome of one call shape.
pub struct OutcomeCallbacks<T, E, N = NoNamedOutcome> {
    success: Option<Callback<T>>,
    error: Option<Callback<E>>,
    named: HashMap<N, Action>,
}

impl<T, E, N> OutcomeCallbacks<T, E, N>
where
    N: Eq + Hash,
{
    /// No callbacks registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            success: None,
            error: None,
            named: HashMap::new(),
        }
    }

    /// Register the success callback.
    #[must_use]
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(f));
        self
    }

    /// Register the error callback.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(f));
        self
    }

    /// Register the callback for the named outcome `tag`.
    #[must_use]
    pub fn on_named<F>(mut self, tag: N, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.named.insert(tag, Arc::new(f));
        self
    }

    /// Set the success callback from an optional value.
    #[must_use]
    pub fn with_success(mut self, f: Option<Callback<T>>) -> Self {
        self.success = f;
        self
    }

    /// Set the error callback from an optional value.
    #[must_use]
    pub fn with_error(mut self, f: Option<Callback<E>>) -> Self {
        self.error = f;
        self
    }

    /// `true` if a callback exists for `outcome`.
    pub fn handles(&self, outcome: &Outcome<T, E, N>) -> bool {
        match outcome {
            Outcome::Success(_) => self.success.is_some(),
            Outcome::Error(_) => self.error.is_some(),
            Outcome::Named(tag) => self.named.contains_key(tag),
        }
    }
}

impl<T, E, N> OutcomeCallbacks<T, E, N>
where
    T: Send + 'static,
    E: Send + 'static,
    N: Eq + Hash,
{
    /// Bind `outcome` to its callback, moving the payload into a work item.
    /// Returns `None` when the caller registered no callback for it.
    pub fn bind(&self, outcome: Outcome<T, E, N>) -> Option<Job> {
        let job: Job = match outcome {
            Outcome::Success(payload) => {
                let f = Arc::clone(self.success.as_ref()?);
                Box::new(move || f(payload))
            }
            Outcome::Error(payload) => {
                let f = Arc::clone(self.error.as_ref()?);
                Box::new(move || f(payload))
            }
            Outcome::Named(tag) => {
                let f = Arc::clone(self.named.get(&tag)?);
                Box::new(move || f())
            }
        };
        Some(job)
    }
}

impl<T, E, N> Default for OutcomeCallbacks<T, E, N>
where
    N: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, N> Clone for OutcomeCallbacks<T, E, N>
where
    N: Clone,
{
    fn clone(&self) -> Self {
        Self {
            success: self.success.clone(),
            error: self.error.clone(),
            named: self.named.clone(),
        }
    }
}

impl<T, E, N: Debug> Debug for OutcomeCallbacks<T, E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeCallbacks")
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Receives the single outcome of one asynchronous call and forwards it to
/// the user's callback, immediately or on the next main-thread tick.
pub struct CallbackAdapter<T, E, N = NoNamedOutcome> {
    call_id: Uuid,
    operation: &'static str,
    callbacks: OutcomeCallbacks<T, E, N>,
    context: DispatchContext,
    delivered: AtomicBool,
}

impl<T, E, N> CallbackAdapter<T, E, N>
where
    T: Send + 'static,
    E: Send + 'static,
    N: Copy + Eq + Hash + Debug + Send + 'static,
{
    pub(crate) fn new(
        context: DispatchContext,
        operation: &'static str,
        callbacks: OutcomeCallbacks<T, E, N>,
    ) -> Self {
        let call_id = Uuid::new_v4();
        trace!(%call_id, operation, "callback adapter created");
        Self {
            call_id,
            operation,
            callbacks,
            context,
            delivered: AtomicBool::new(false),
        }
    }

    /// Report success.
    pub fn on_success(&self, payload: T) {
        self.deliver(Outcome::Success(payload));
    }

    /// Report a structured error.
    pub fn on_error(&self, error: E) {
        self.deliver(Outcome::Error(error));
    }

    /// Report a named alternative outcome.
    pub fn on_named(&self, tag: N) {
        self.deliver(Outcome::Named(tag));
    }

    /// Report `outcome`. Expected at most once per adapter.
    pub fn deliver(&self, outcome: Outcome<T, E, N>) {
        if self.delivered.swap(true, Ordering::AcqRel) {
            warn!(
                call_id = %self.call_id,
                operation = self.operation,
                outcome = outcome.kind(),
                "callback adapter received more than one outcome"
            );
        }

        let kind = outcome.kind();
        let Some(job) = self.callbacks.bind(outcome) else {
            trace!(
                call_id = %self.call_id,
                operation = self.operation,
                outcome = kind,
                "no callback registered for outcome"
            );
            return;
        };

        let mode = self.context.delivery_mode();
        trace!(
            call_id = %self.call_id,
            operation = self.operation,
            outcome = kind,
            ?mode,
            "delivering outcome"
        );
        deliver(mode, self.context.dispatcher(), job);
    }
}

impl<T, E, N> CallbackAdapter<T, E, N> {
    /// Identifier used in log records for this call.
    #[must_use]
    pub const fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// Name of the operation this adapter belongs to.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// `true` once an outcome has been reported.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered.load(Ordering::Acquire)
    }
}

impl<T, E, N: Debug> Debug for CallbackAdapter<T, E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("call_id", &self.call_id)
            .field("operation", &self.operation)
            .field("callbacks", &self.callbacks)
            .field("delivered", &self.is_delivered())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Review {
        Pending,
        Rejected,
    }

    fn context(legacy: bool) -> DispatchContext {
        DispatchContext::new(
            DispatchConfig::new()
                .with_worker_count(1)
                .with_legacy_callbacks(legacy),
        )
        .unwrap()
    }

    #[test]
    fn test_bind_missing_callback_is_none() {
        let callbacks = OutcomeCallbacks::<u8, u8>::new().on_success(|_| {});
        assert!(callbacks.handles(&Outcome::Success(1)));
        assert!(!callbacks.handles(&Outcome::Error(1)));
        assert!(callbacks.bind(Outcome::Error(1)).is_none());
        assert!(callbacks.bind(Outcome::Success(1)).is_some());
    }

    #[test]
    fn test_bind_moves_payload() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let callbacks =
            OutcomeCallbacks::<String, ()>::new().on_success(move |s| *sink.lock() = Some(s));
        let job = callbacks.bind(Outcome::Success("coins".into())).unwrap();
        assert!(seen.lock().is_none());
        job();
        assert_eq!(seen.lock().as_deref(), Some("coins"));
    }

    #[test]
    fn test_named_outcomes_route_by_tag() {
        let ctx = context(false);
        let pending = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pending);
        let callbacks = OutcomeCallbacks::<(), (), Review>::new()
            .on_named(Review::Pending, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let adapter = ctx.adapter("review", callbacks.clone());
        adapter.on_named(Review::Rejected);
        assert!(!ctx.dispatcher().has_pending());

        let adapter = ctx.adapter("review", callbacks);
        adapter.on_named(Review::Pending);
        assert_eq!(pending.load(Ordering::SeqCst), 0);
        ctx.tick();
        assert_eq!(pending.load(Ordering::SeqCst), 1);
        ctx.shutdown();
    }

    #[test]
    fn test_legacy_delivery_runs_on_reporting_thread() {
        let ctx = context(true);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let adapter = ctx.adapter(
            "init",
            OutcomeCallbacks::<(), String>::new()
                .on_success(move |()| *sink.lock() = Some(thread::current().id())),
        );

        let reporter = thread::spawn(move || {
            adapter.on_success(());
            thread::current().id()
        })
        .join()
        .unwrap();

        assert_eq!(*seen.lock(), Some(reporter));
        assert!(ctx.tick().is_idle());
        ctx.shutdown();
    }

    #[test]
    fn test_duplicate_delivery_is_forwarded() {
        let ctx = context(false);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let adapter = ctx.adapter(
            "rewards",
            OutcomeCallbacks::<u32, ()>::new().on_success(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(!adapter.is_delivered());
        adapter.on_success(1);
        assert!(adapter.is_delivered());
        adapter.on_success(2);
        assert_eq!(ctx.tick().executed, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        ctx.shutdown();
    }

    #[test]
    fn test_outcome_kind_labels() {
        assert_eq!(Outcome::<u8, u8>::Success(0).kind(), "success");
        assert_eq!(Outcome::<u8, u8>::Error(0).kind(), "error");
        assert_eq!(Outcome::<u8, u8, Review>::Named(Review::Pending).kind(), "named");
    }

    #[test]
    fn test_debug_hides_closures() {
        let callbacks = OutcomeCallbacks::<u8, u8, Review>::new()
            .on_success(|_| {})
            .on_named(Review::Pending, || {});
        let rendered = format!("{callbacks:?}");
        assert!(rendered.contains("success: true"));
        assert!(rendered.contains("error: false"));
        assert!(rendered.contains("Pending"));
    }
}
