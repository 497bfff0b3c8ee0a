//! Core pool, capacity source, scheduler facade and audit channel.

pub mod error;
pub mod audit;
pub mod capacity;
pub mod scheduler;
pub mod worker_pool;

pub use error::{AppResult, PoolError, TaskError};
pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use capacity::{
    CapacityListener, CapacitySource, ListenerState, LiveCapacity, clamp_capacity,
};
pub use scheduler::{Scheduler, TaskHandle};
pub use worker_pool::{PoolStats, ResizablePool, HANDOFF_GRACE};
