//! Resizable worker pool built on OS threads and a zero-capacity handoff.
//!
//! This module holds the state shared between the pool handle and its worker
//! threads. The pool itself lives in `pool`, the worker loop in `worker`.
//!
//! # Key Features
//!
//! - **Rendezvous handoff**: `crossbeam_channel::bounded(0)` only accepts a
//!   `try_send` when a worker is parked in `recv`, so nothing is ever buffered
//! - **One control word**: capacity and worker count share an `AtomicU64`, so a
//!   slot reservation and a capacity change can never interleave inconsistently
//! - **Lock-free counters**: statistics are atomics; the busy and completion
//!   counters use release/acquire so a finished task is visible to the next
//!   submission
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_io_pool::core::{LiveCapacity, ResizablePool};
//! use prometheus_io_pool::config::PoolConfig;
//!
//! let capacity = LiveCapacity::new(4);
//! let pool = ResizablePool::new(PoolConfig::new(), &capacity)?;
//! pool.submit(|| flush_segment())?;
//! ```

mod pool;
mod worker;

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::capacity::clamp_capacity;

pub use pool::{ResizablePool, HANDOFF_GRACE};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Current capacity ceiling.
    pub capacity: u32,

    /// Live worker threads (busy, idle, or between the two).
    pub active_workers: u32,

    /// Workers currently running a task.
    pub busy_workers: u32,

    /// Workers parked on the handoff channel.
    pub idle_workers: u32,

    /// Total tasks accepted.
    pub submitted_tasks: u64,

    /// Total tasks that ran to completion.
    pub completed_tasks: u64,

    /// Total tasks that panicked.
    pub failed_tasks: u64,

    /// Total submissions rejected (saturation or spawn failure).
    pub rejected_tasks: u64,

    /// Total worker threads started.
    pub spawned_workers: u64,

    /// Total worker threads that exited.
    pub retired_workers: u64,

    /// Total thread spawn failures.
    pub spawn_failures: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub busy_workers: AtomicU32,
    pub idle_workers: AtomicU32,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub rejected_tasks: AtomicU64,
    pub spawned_workers: AtomicU64,
    pub retired_workers: AtomicU64,
    pub spawn_failures: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, capacity: u32, active_workers: u32) -> PoolStats {
        PoolStats {
            capacity,
            active_workers,
            busy_workers: self.busy_workers.load(Ordering::Acquire),
            idle_workers: self.idle_workers.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Acquire),
            failed_tasks: self.failed_tasks.load(Ordering::Acquire),
            rejected_tasks: self.rejected_tasks.load(Ordering::Relaxed),
            spawned_workers: self.spawned_workers.load(Ordering::Relaxed),
            retired_workers: self.retired_workers.load(Ordering::Relaxed),
            spawn_failures: self.spawn_failures.load(Ordering::Relaxed),
        }
    }
}

const WORKER_MASK: u64 = 0xFFFF_FFFF;

const fn pack(capacity: u32, workers: u32) -> u64 {
    ((capacity as u64) << 32) | workers as u64
}

#[allow(clippy::cast_possible_truncation)]
const fn capacity_of(ctl: u64) -> u32 {
    (ctl >> 32) as u32
}

#[allow(clippy::cast_possible_truncation)]
const fn workers_of(ctl: u64) -> u32 {
    (ctl & WORKER_MASK) as u32
}

/// Capacity ceiling (high half) and live worker count (low half).
#[derive(Debug)]
pub(crate) struct WorkerControl {
    ctl: AtomicU64,
}

impl WorkerControl {
    pub fn new(capacity: u32) -> Self {
        Self {
            ctl: AtomicU64::new(pack(capacity, 0)),
        }
    }

    pub fn capacity(&self) -> u32 {
        capacity_of(self.ctl.load(Ordering::Acquire))
    }

    pub fn workers(&self) -> u32 {
        workers_of(self.ctl.load(Ordering::Acquire))
    }

    /// Replace the ceiling, keeping the worker count. Returns the old ceiling.
    pub fn set_capacity(&self, capacity: u32) -> u32 {
        let previous = self
            .ctl
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ctl| {
                Some(pack(capacity, workers_of(ctl)))
            })
            .unwrap_or_else(|ctl| ctl);
        capacity_of(previous)
    }

    /// Claim a worker slot if the count is below the ceiling.
    ///
    /// Returns the new worker count, or the ceiling that blocked the claim.
    pub fn try_reserve(&self) -> Result<u32, u32> {
        self.ctl
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ctl| {
                (workers_of(ctl) < capacity_of(ctl)).then(|| ctl + 1)
            })
            .map(|previous| workers_of(previous) + 1)
            .map_err(capacity_of)
    }

    /// Give back a claimed slot. Returns the remaining worker count.
    pub fn release(&self) -> u32 {
        let previous = self.ctl.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(workers_of(previous) > 0, "worker slot released twice");
        workers_of(previous) - 1
    }
}

/// A unit of work as seen by a worker.
///
/// `run` executes the task body and may panic. `complete` runs afterwards,
/// once the worker no longer counts as busy, so whatever it signals can be
/// followed by a submission that finds the worker available.
pub(crate) trait Runnable: Send {
    fn run(&mut self);

    fn complete(self: Box<Self>) {}
}

struct Detached<F>(Option<F>);

impl<F: FnOnce() + Send> Runnable for Detached<F> {
    fn run(&mut self) {
        if let Some(task) = self.0.take() {
            task();
        }
    }
}

/// Boxed unit of work handed to a worker.
pub(crate) struct Job(Box<dyn Runnable>);

impl Job {
    pub fn new(task: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(Detached(Some(task))))
    }

    pub fn from_runnable(runnable: impl Runnable + 'static) -> Self {
        Self(Box::new(runnable))
    }

    pub fn run(&mut self) {
        self.0.run();
    }

    pub fn complete(self) {
        self.0.complete();
    }
}

/// State shared by the pool handle, its workers and the capacity listener.
pub(crate) struct PoolShared {
    pub name: String,
    pub ctl: WorkerControl,
    pub counters: PoolCounters,
    pub worker_sequence: AtomicU64,
    pub idle_timeout: Duration,
    pub stack_size: Option<usize>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl PoolShared {
    pub fn new(config: &PoolConfig, audit: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            name: config.thread_name_prefix.clone(),
            ctl: WorkerControl::new(0),
            counters: PoolCounters::default(),
            worker_sequence: AtomicU64::new(0),
            idle_timeout: config.idle_timeout(),
            stack_size: config.thread_stack_size,
            audit,
        }
    }

    /// Whether some live worker is not running a task: parked, on its way
    /// back to the handoff, or retiring.
    pub fn has_unbusy_worker(&self) -> bool {
        self.ctl.workers() > self.counters.busy_workers.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.ctl.capacity(), self.ctl.workers())
    }

    pub fn audit(&self, worker: Option<&str>, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(self.name.as_str(), worker, action, detail));
        }
    }

    /// Clamp a raw capacity value, reporting out-of-range input.
    pub fn resolve_capacity(&self, value: i64) -> u32 {
        clamp_capacity(value).unwrap_or_else(|err| {
            warn!(pool = %self.name, error = %err, "Clamping out-of-range capacity value");
            self.audit(None, AuditAction::InvalidCapacity, Some(err.to_string()));
            if value < 0 { 0 } else { u32::MAX }
        })
    }

    /// Apply a capacity notification. Growth takes effect on the next
    /// submission; shrink only blocks future spawns.
    pub fn apply_capacity(&self, value: i64) {
        let capacity = self.resolve_capacity(value);
        let previous = self.ctl.set_capacity(capacity);
        let active_workers = self.ctl.workers();

        match capacity.cmp(&previous) {
            CmpOrdering::Equal => {
                debug!(pool = %self.name, capacity, "Capacity unchanged");
                return;
            }
            CmpOrdering::Greater => {
                info!(
                    pool = %self.name,
                    from = previous,
                    to = capacity,
                    active_workers,
                    "Pool capacity raised"
                );
            }
            CmpOrdering::Less => {
                info!(
                    pool = %self.name,
                    from = previous,
                    to = capacity,
                    active_workers,
                    "Pool capacity lowered, surplus workers retire when idle"
                );
            }
        }

        let busy = self.counters.busy_workers.load(Ordering::Relaxed);
        if capacity == 0 && busy > 0 {
            warn!(
                pool = %self.name,
                busy_workers = busy,
                "Capacity set to zero with tasks in flight, pool will drain"
            );
        }

        self.audit(
            None,
            AuditAction::CapacityChanged,
            Some(format!("{previous} -> {capacity}")),
        );
    }
}
