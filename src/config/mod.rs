//! Configuration models for pools and environment loading.

pub mod pool;

pub use pool::{PoolConfig, SchedulerConfig};
