//! Builders to construct resizable pools from configuration.

use std::sync::Arc;

use crate::config::{PoolConfig, SchedulerConfig};
use crate::core::{AuditSink, CapacitySource, LiveCapacity, PoolError, ResizablePool, Scheduler};

/// Step-by-step construction of a [`ResizablePool`].
pub struct PoolBuilder {
    config: PoolConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl PoolBuilder {
    /// Start from a pool configuration.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self { config, audit: None }
    }

    /// Pool configuration accessor.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Report lifecycle, rejection and failure events to `sink`.
    #[must_use]
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Build the pool and subscribe it to `source`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn build(self, source: &dyn CapacitySource) -> Result<ResizablePool, PoolError> {
        ResizablePool::build(self.config, source, self.audit)
    }
}

/// Build a scheduler and the live capacity value that drives it.
///
/// The returned [`LiveCapacity`] starts at `cfg.io_threads`; calling `set` on it
/// resizes the pool.
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if the configuration is invalid.
pub fn build_scheduler(
    cfg: &SchedulerConfig,
) -> Result<(Scheduler, Arc<LiveCapacity>), PoolError> {
    cfg.validate().map_err(PoolError::InvalidConfig)?;

    let capacity = Arc::new(LiveCapacity::new(cfg.io_threads));
    let pool = PoolBuilder::new(cfg.pool.clone()).build(capacity.as_ref())?;
    Ok((Scheduler::new(pool), capacity))
}
