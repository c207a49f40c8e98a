//! Integration tests for main-thread dispatch
//!
//! These tests validate the ordering and threading guarantees of the
//! dispatcher and callback adapters:
//! - Same-thread submission order is kept
//! - Work queued during a drain runs on the next tick
//! - Concurrent producers lose and duplicate nothing
//! - Legacy mode delivers inline, default mode defers to the ticking thread
//! - Error payloads outlive the native objects they were read from

use parking_lot::Mutex;
use playtime_bridge::config::DispatchConfig;
use playtime_bridge::core::{
    DeliveryMode, DispatchContext, MainThreadDispatcher, Outcome, OutcomeCallbacks,
};
use playtime_bridge::sdk::ServiceError;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn context(legacy: bool) -> DispatchContext {
    DispatchContext::new(
        DispatchConfig::new()
            .with_worker_count(2)
            .with_legacy_callbacks(legacy),
    )
    .unwrap()
}

/// Shared log that work items append their label to.
#[derive(Clone, Default)]
struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    fn push(&self, label: impl Into<String>) {
        self.entries.lock().push(label.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    fn recorder(&self, label: &str) -> Box<dyn FnOnce() + Send> {
        let trace = self.clone();
        let label = label.to_string();
        Box::new(move || trace.push(label))
    }
}

fn position(entries: &[String], label: &str) -> usize {
    entries
        .iter()
        .position(|e| e == label)
        .unwrap_or_else(|| panic!("{label} missing from {entries:?}"))
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn test_single_thread_order_is_preserved() {
    let dispatcher = MainThreadDispatcher::new(4);
    let trace = Trace::default();
    let labels: Vec<String> = (0..100).map(|i| format!("item-{i}")).collect();
    for label in &labels {
        dispatcher.run_on_main_thread(trace.recorder(label));
    }

    let report = dispatcher.tick();
    assert_eq!(report.executed, 100);
    assert_eq!(trace.snapshot(), labels);
}

#[test]
fn test_abc_from_one_thread_d_from_another() {
    let ctx = context(false);
    let trace = Trace::default();

    let producer_one = {
        let ctx = ctx.clone();
        let trace = trace.clone();
        thread::spawn(move || {
            for label in ["A", "B", "C"] {
                ctx.run_on_main_thread(trace.recorder(label));
            }
        })
    };
    let producer_two = {
        let ctx = ctx.clone();
        let trace = trace.clone();
        thread::spawn(move || ctx.run_on_main_thread(trace.recorder("D")))
    };
    producer_one.join().unwrap();
    producer_two.join().unwrap();

    assert_eq!(ctx.tick().executed, 4);
    let entries = trace.snapshot();
    assert_eq!(entries.len(), 4);
    assert!(position(&entries, "A") < position(&entries, "B"));
    assert!(position(&entries, "B") < position(&entries, "C"));
    assert_eq!(entries.iter().filter(|e| *e == "D").count(), 1);

    // Nothing left for a second tick.
    assert!(ctx.tick().is_idle());
    ctx.shutdown();
}

#[test]
fn test_nested_submission_waits_for_next_tick() {
    let ctx = context(false);
    let trace = Trace::default();

    let nested_ctx = ctx.clone();
    let nested_trace = trace.clone();
    ctx.run_on_main_thread(move || {
        nested_trace.push("outer");
        let again = nested_trace.clone();
        nested_ctx.run_on_main_thread(move || again.push("inner"));
    });

    assert_eq!(ctx.tick().executed, 1);
    assert_eq!(trace.snapshot(), vec!["outer"]);
    assert_eq!(ctx.tick().executed, 1);
    assert_eq!(trace.snapshot(), vec!["outer", "inner"]);
    ctx.shutdown();
}

#[test]
fn test_idle_tick_has_no_effect() {
    let ctx = context(false);
    for _ in 0..10 {
        assert!(ctx.tick().is_idle());
    }
    assert_eq!(ctx.dispatcher().stats().drains, 0);
    ctx.shutdown();
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_producers_exactly_once() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 250;

    let ctx = context(false);
    let (tx, rx) = flume::unbounded::<(usize, usize)>();
    let barrier = Arc::new(Barrier::new(PRODUCERS));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng = rand::rng();
                barrier.wait();
                for seq in 0..PER_PRODUCER {
                    let tx = tx.clone();
                    ctx.run_on_main_thread(move || {
                        let _ = tx.send((producer, seq));
                    });
                    if rng.random_bool(0.05) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    drop(tx);

    // Tick while producers are still running, like a render loop would.
    let mut executed = 0;
    while handles.iter().any(|h| !h.is_finished()) {
        executed += ctx.tick().executed;
        thread::sleep(Duration::from_millis(1));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    executed += ctx.tick().executed;
    assert_eq!(executed, PRODUCERS * PER_PRODUCER);

    let received: Vec<(usize, usize)> = rx.try_iter().collect();
    assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);
    let unique: HashSet<_> = received.iter().copied().collect();
    assert_eq!(unique.len(), received.len(), "an item ran twice");

    for producer in 0..PRODUCERS {
        let seqs: Vec<usize> = received
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
    ctx.shutdown();
}

#[test]
fn test_failing_item_is_isolated() {
    let ctx = context(false);
    let trace = Trace::default();
    ctx.run_on_main_thread(trace.recorder("before"));
    ctx.run_on_main_thread(|| panic!("callback bug"));
    ctx.run_on_main_thread(trace.recorder("after"));

    let report = ctx.tick();
    assert_eq!(report.executed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(trace.snapshot(), vec!["before", "after"]);
    assert_eq!(ctx.dispatcher().stats().failed, 1);
    ctx.shutdown();
}

// ============================================================================
// DELIVERY MODES
// ============================================================================

#[test]
fn test_legacy_mode_runs_on_reporting_thread() {
    let ctx = context(true);
    assert_eq!(ctx.delivery_mode(), DeliveryMode::Legacy);

    let ran_on = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&ran_on);
    let adapter = ctx.adapter(
        "init",
        OutcomeCallbacks::<(), ServiceError>::new()
            .on_success(move |()| *sink.lock() = Some(thread::current().id())),
    );

    let reporter = thread::spawn(move || {
        adapter.on_success(());
        thread::current().id()
    })
    .join()
    .unwrap();

    assert_eq!(*ran_on.lock(), Some(reporter));
    assert!(!ctx.dispatcher().has_pending());
    ctx.shutdown();
}

#[test]
fn test_default_mode_runs_on_ticking_thread() {
    let ctx = context(false);
    let ran_on = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&ran_on);
    let adapter = ctx.adapter(
        "init",
        OutcomeCallbacks::<(), ServiceError>::new()
            .on_success(move |()| *sink.lock() = Some(thread::current().id())),
    );

    thread::spawn(move || adapter.on_success(())).join().unwrap();
    assert!(ran_on.lock().is_none());

    assert_eq!(ctx.tick().executed, 1);
    assert_eq!(*ran_on.lock(), Some(thread::current().id()));
    ctx.shutdown();
}

#[test]
fn test_timeout_error_survives_native_object() {
    /// Stands in for a service-owned object that is recycled after the call.
    struct NativeException {
        message: Mutex<Option<String>>,
    }

    let ctx = context(false);
    let received = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    let adapter = ctx.adapter(
        "request_rewards",
        OutcomeCallbacks::<(), ServiceError>::new()
            .on_error(move |err| *sink.lock() = Some(err)),
    );

    let native = Arc::new(NativeException {
        message: Mutex::new(Some("timeout".to_string())),
    });
    let reporter_native = Arc::clone(&native);
    thread::spawn(move || {
        let message = reporter_native.message.lock().clone().unwrap_or_default();
        adapter.deliver(Outcome::Error(ServiceError::new(message)));
        // The service invalidates its object right after reporting.
        reporter_native.message.lock().take();
    })
    .join()
    .unwrap();
    drop(native);

    assert!(received.lock().is_none());
    ctx.tick();
    assert_eq!(
        received.lock().as_ref().map(|e| e.message.as_str()),
        Some("timeout")
    );
    ctx.shutdown();
}

#[test]
fn test_missing_callback_is_silent() {
    let ctx = context(false);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let adapter = ctx.adapter(
        "do_payout",
        OutcomeCallbacks::<i64, ServiceError>::new().on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    adapter.on_error(ServiceError::new("not enough coins"));
    assert!(adapter.is_delivered());
    assert!(ctx.tick().is_idle());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    ctx.shutdown();
}
