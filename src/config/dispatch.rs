//! Dispatcher and background pool configuration.

use serde::{Deserialize, Serialize};

/// Environment variable enabling legacy (immediate) callback delivery.
pub const ENV_LEGACY_CALLBACKS: &str = "PLAYTIME_LEGACY_CALLBACKS";
/// Environment variable overriding the background worker count.
pub const ENV_WORKER_COUNT: &str = "PLAYTIME_WORKER_COUNT";
/// Environment variable overriding the initial queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "PLAYTIME_QUEUE_CAPACITY";
/// Environment variable overriding the worker thread stack size.
pub const ENV_THREAD_STACK_SIZE: &str = "PLAYTIME_THREAD_STACK_SIZE";

const DEFAULT_QUEUE_CAPACITY: usize = 8;
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for a [`DispatchContext`](crate::core::DispatchContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deliver callbacks on the reporting thread instead of the main thread.
    pub legacy_callbacks: bool,
    /// Number of background worker threads used by `run_async`.
    pub worker_count: usize,
    /// Pre-allocated capacity of each main-thread queue.
    pub initial_queue_capacity: usize,
    /// Stack size for background worker threads, in bytes.
    pub thread_stack_size: usize,
    /// Name prefix for background worker threads.
    pub thread_name_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            legacy_callbacks: false,
            worker_count: num_cpus::get().max(1),
            initial_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: "playtime-worker".into(),
        }
    }
}

impl DispatchConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable legacy callback delivery.
    #[must_use]
    pub const fn with_legacy_callbacks(mut self, legacy: bool) -> Self {
        self.legacy_callbacks = legacy;
        self
    }

    /// Set the number of background worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the initial capacity of the main-thread queues.
    #[must_use]
    pub const fn with_initial_queue_capacity(mut self, capacity: usize) -> Self {
        self.initial_queue_capacity = capacity;
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.initial_queue_capacity == 0 {
            return Err("initial_queue_capacity must be greater than 0".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env` first
    /// if present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message when a variable is set but cannot be parsed, or when
    /// the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_LEGACY_CALLBACKS) {
            cfg.legacy_callbacks = parse_bool(&raw)
                .ok_or_else(|| format!("{ENV_LEGACY_CALLBACKS}: expected a boolean, got `{raw}`"))?;
        }
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            cfg.worker_count = parse_usize(ENV_WORKER_COUNT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            cfg.initial_queue_capacity = parse_usize(ENV_QUEUE_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_THREAD_STACK_SIZE) {
            cfg.thread_stack_size = parse_usize(ENV_THREAD_STACK_SIZE, &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}: invalid number `{raw}`: {e}"))
}
