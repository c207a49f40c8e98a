//! Delivery mode selection and the single deliver path.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::warn;

use super::{DispatchError, MainThreadDispatcher};

/// How outcome callbacks reach user code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Queue the callback for the next main-thread tick.
    Deferred,
    /// Invoke the callback on the thread that reported the outcome.
    Legacy,
}

impl DeliveryMode {
    /// Map the legacy flag to a mode.
    #[must_use]
    pub const fn from_legacy(legacy: bool) -> Self {
        if legacy {
            Self::Legacy
        } else {
            Self::Deferred
        }
    }
}

const LEGACY: u8 = 0b01;
const SEALED: u8 = 0b10;

/// Write-once-before-use legacy callback switch.
///
/// The flag can be changed freely until it is first read through
/// [`get`](Self::get); from then on it is sealed and writes are rejected.
/// Both bits live in one atomic so a write can never land after the read
/// that sealed it.
#[derive(Debug)]
pub struct LegacyMode {
    state: AtomicU8,
}

impl LegacyMode {
    /// Create an unsealed switch.
    #[must_use]
    pub const fn new(legacy: bool) -> Self {
        Self {
            state: AtomicU8::new(if legacy { LEGACY } else { 0 }),
        }
    }

    /// Change the switch.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::LegacyModeSealed` if the flag has already been read.
    pub fn set(&self, legacy: bool) -> Result<(), DispatchError> {
        let bit = if legacy { LEGACY } else { 0 };
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & SEALED != 0 {
                warn!(requested = legacy, "legacy callback mode changed after first use; ignored");
                return Err(DispatchError::LegacyModeSealed);
            }
            match self.state.compare_exchange_weak(
                current,
                (current & !LEGACY) | bit,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Read the switch and seal it.
    pub fn get(&self) -> DeliveryMode {
        let previous = self.state.fetch_or(SEALED, Ordering::AcqRel);
        DeliveryMode::from_legacy(previous & LEGACY != 0)
    }

    /// Seal the switch without reading it.
    pub fn seal(&self) {
        self.state.fetch_or(SEALED, Ordering::AcqRel);
    }

    /// `true` once the flag has been read.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state.load(Ordering::Acquire) & SEALED != 0
    }
}

impl Default for LegacyMode {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Run `work` now or queue it on `dispatcher`, depending on `mode`.
pub fn deliver<F>(mode: DeliveryMode, dispatcher: &MainThreadDispatcher, work: F)
where
    F: FnOnce() + Send + 'static,
{
    match mode {
        DeliveryMode::Legacy => work(),
        DeliveryMode::Deferred => dispatcher.run_on_main_thread(work),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_legacy_mode_seals_on_read() {
        let mode = LegacyMode::default();
        assert!(!mode.is_sealed());
        mode.set(true).unwrap();
        mode.set(false).unwrap();
        assert_eq!(mode.get(), DeliveryMode::Deferred);
        assert!(mode.is_sealed());

        let err = mode.set(true).unwrap_err();
        assert!(matches!(err, DispatchError::LegacyModeSealed));
        assert_eq!(mode.get(), DeliveryMode::Deferred);
    }

    #[test]
    fn test_accepted_write_is_never_lost_to_a_racing_read() {
        for _ in 0..2_000 {
            let mode = Arc::new(LegacyMode::default());
            let barrier = Arc::new(Barrier::new(2));
            let writer = {
                let mode = Arc::clone(&mode);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut accepted = 0;
                    while mode.set(accepted % 2 == 0).is_ok() {
                        accepted += 1;
                    }
                    accepted
                })
            };

            barrier.wait();
            let observed = mode.get();
            let accepted = writer.join().unwrap();

            // Whatever the read saw is final; a later accepted write would change it.
            assert_eq!(mode.get(), observed);
            let expected = match accepted {
                0 => DeliveryMode::Deferred,
                n => DeliveryMode::from_legacy((n - 1) % 2 == 0),
            };
            assert_eq!(observed, expected);
        }
    }

    #[test]
    fn test_deliver_legacy_runs_inline() {
        let dispatcher = MainThreadDispatcher::new(2);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        deliver(DeliveryMode::Legacy, &dispatcher, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.has_pending());
    }

    #[test]
    fn test_deliver_deferred_waits_for_tick() {
        let dispatcher = MainThreadDispatcher::new(2);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        deliver(DeliveryMode::Deferred, &dispatcher, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        dispatcher.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mode_from_legacy() {
        assert_eq!(DeliveryMode::from_legacy(true), DeliveryMode::Legacy);
        assert_eq!(DeliveryMode::from_legacy(false), DeliveryMode::Deferred);
    }
}
