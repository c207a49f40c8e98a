//! Default subscriber for bridge diagnostics.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "playtime_bridge=warn";

/// Install a fmt subscriber unless the host already set one.
///
/// Lines carry the emitting thread's name, which tells a `playtime-worker-*`
/// report apart from the main thread draining the tick queue. Without
/// `RUST_LOG` only bridge warnings are shown: duplicate outcomes, panicking
/// callbacks and late legacy-mode switches.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        assert!(tracing::dispatcher::has_been_set());
        tracing::warn!(target: "playtime_bridge", "second install was skipped");
    }

    #[test]
    fn test_default_filter_parses() {
        let directive = DEFAULT_FILTER.parse::<tracing_subscriber::filter::Directive>();
        assert!(directive.is_ok());
    }
}
