//! Audit sink implementations.
//!
//! The pool reports worker lifecycle, rejections, task failures and capacity
//! changes here in addition to `tracing`. Sinks are shared across worker threads,
//! so `record` takes `&self`.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// Kind of pool event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A new worker thread was started.
    WorkerSpawned,
    /// A worker thread exited.
    WorkerRetired,
    /// A submission was rejected at the ceiling.
    TaskRejected,
    /// The OS could not create a worker thread.
    SpawnFailed,
    /// A task panicked on a worker.
    TaskFailed,
    /// The capacity ceiling changed.
    CapacityChanged,
    /// A capacity notification was out of range and got clamped.
    InvalidCapacity,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Pool identifier (the worker thread-name prefix).
    pub pool: String,
    /// Worker thread name, when the event concerns one worker.
    pub worker: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Count stored events with the given action.
    pub fn count(&self, action: AuditAction) -> usize {
        self.events.lock().iter().filter(|e| e.action == action).count()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh identifier and timestamp.
pub fn build_audit_event(
    pool: impl Into<String>,
    worker: Option<&str>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        pool: pool.into(),
        worker: worker.map(str::to_owned),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}
