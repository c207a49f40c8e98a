//! Runtime adapters for background execution.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
