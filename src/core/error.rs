//! Error types for pool operations.

use thiserror::Error;

/// Errors produced by the worker pool.
///
/// Only [`PoolError::CapacitySaturated`], [`PoolError::SpawnFailed`] and
/// [`PoolError::InvalidConfig`] are ever returned to a caller. The remaining
/// variants are built for the log and audit channel and never escape the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No idle worker and the worker count is already at the ceiling.
    #[error("pool saturated: all {capacity} workers busy")]
    CapacitySaturated {
        /// Capacity ceiling at the time of rejection.
        capacity: u32,
    },
    /// The OS refused to create a new worker thread.
    #[error("failed to spawn worker thread `{name}`: {source}")]
    SpawnFailed {
        /// Name the worker would have carried.
        name: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },
    /// A capacity notification carried a value outside `0..=u32::MAX`.
    #[error("invalid capacity value {value}, clamped to {clamped}")]
    InvalidCapacityValue {
        /// Value delivered by the capacity source.
        value: i64,
        /// Value actually applied.
        clamped: u32,
    },
    /// A task panicked while running on a worker.
    #[error("task failed on worker `{worker}`: {message}")]
    TaskExecutionFailure {
        /// Worker thread name.
        worker: String,
        /// Panic message, if it was a string.
        message: String,
    },
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PoolError {
    /// True for errors that reject a submission.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::CapacitySaturated { .. } | Self::SpawnFailed { .. })
    }
}

/// Errors observed by a [`TaskHandle`](crate::core::TaskHandle) holder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task ended without producing a value (it panicked or was dropped).
    #[error("task aborted before producing a result")]
    Aborted,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
