//! Configuration models for the dispatcher and background pool.

pub mod dispatch;

pub use dispatch::DispatchConfig;
