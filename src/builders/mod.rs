//! Builders to construct pools and schedulers from configuration.

pub mod pool_builder;

pub use pool_builder::{build_scheduler, PoolBuilder};
