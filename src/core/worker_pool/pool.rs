//! The pool handle: submission, rejection and capacity changes.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, trace};

use crate::config::PoolConfig;
use crate::core::audit::{AuditAction, AuditSink};
use crate::core::capacity::{CapacitySource, ListenerState};
use crate::core::PoolError;

use super::worker::spawn_worker;
use super::{Job, PoolShared, PoolStats};

/// Longest a submission waits for a worker that is between tasks.
///
/// Only spent when the ceiling is reached and some live worker is not running
/// a task; a pool whose workers are all busy rejects without waiting.
pub const HANDOFF_GRACE: Duration = Duration::from_millis(50);

const HANDOFF_POLL: Duration = Duration::from_millis(1);

/// Worker pool whose ceiling follows a live [`CapacitySource`].
///
/// Workers are spawned on demand and parked on a zero-capacity channel between
/// tasks. A worker that stays parked past the idle timeout exits, which is the
/// only way the pool ever shrinks.
///
/// # Design
///
/// - **No backlog**: a submission either meets an idle worker, gets a freshly
///   spawned one, or fails with [`PoolError::CapacitySaturated`]
/// - **Never blocks indefinitely**: a saturated pool whose workers are all busy
///   rejects at once; a worker returning from a task is waited for at most
///   [`HANDOFF_GRACE`]
/// - **Detached workers**: thread handles are dropped on spawn, so workers never
///   hold up process exit
pub struct ResizablePool {
    /// State shared with workers and the capacity listener.
    shared: Arc<PoolShared>,

    /// Rendezvous sender. Dropping it lets idle workers exit.
    handoff: Sender<Job>,

    /// Receiver template cloned into every new worker.
    receiver: Receiver<Job>,
}

impl ResizablePool {
    /// Create a pool whose capacity tracks `source`.
    ///
    /// Reads `source.current()` once and registers a single listener for later
    /// changes. No worker is started until the first submission.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: PoolConfig, source: &dyn CapacitySource) -> Result<Self, PoolError> {
        Self::build(config, source, None)
    }

    pub(crate) fn build(
        config: PoolConfig,
        source: &dyn CapacitySource,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let shared = Arc::new(PoolShared::new(&config, audit));
        let capacity = shared.resolve_capacity(source.current());
        shared.ctl.set_capacity(capacity);

        let listener_state = Arc::downgrade(&shared);
        source.subscribe(Box::new(move |value: i64| {
            listener_state.upgrade().map_or(ListenerState::Unsubscribed, |shared| {
                shared.apply_capacity(value);
                ListenerState::Subscribed
            })
        }));

        let (handoff, receiver) = bounded::<Job>(0);

        info!(
            pool = %shared.name,
            capacity,
            idle_timeout_ms = u64::try_from(shared.idle_timeout.as_millis()).unwrap_or(u64::MAX),
            "Resizable pool initialized"
        );

        Ok(Self {
            shared,
            handoff,
            receiver,
        })
    }

    /// Submit a task for execution on a worker thread.
    ///
    /// The task runs on an idle worker if one is parked on the handoff, otherwise
    /// on a newly spawned worker when the ceiling allows it. When the ceiling is
    /// reached but a worker has just finished and is on its way back to the
    /// handoff, the submission waits at most [`HANDOFF_GRACE`] for it.
    ///
    /// # Errors
    ///
    /// - `PoolError::CapacitySaturated` if every worker is busy and the worker
    ///   count is at the ceiling
    /// - `PoolError::SpawnFailed` if the OS could not create a worker thread
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_job(Job::new(task))
    }

    pub(crate) fn submit_job(&self, job: Job) -> Result<(), PoolError> {
        // The pool keeps a receiver, so the channel never disconnects here.
        let mut job = match self.handoff.try_send(job) {
            Ok(()) => {
                self.handed_off();
                return Ok(());
            }
            Err(err) => err.into_inner(),
        };

        let deadline = Instant::now() + HANDOFF_GRACE;
        loop {
            let capacity = match self.shared.ctl.try_reserve() {
                Ok(active_workers) => return self.start_worker(job, active_workers),
                Err(capacity) => capacity,
            };

            let now = Instant::now();
            if now >= deadline || !self.shared.has_unbusy_worker() {
                return Err(self.reject(capacity));
            }

            // Short slices: a retiring worker frees its slot instead of parking.
            match self.handoff.send_timeout(job, HANDOFF_POLL.min(deadline - now)) {
                Ok(()) => {
                    self.handed_off();
                    return Ok(());
                }
                Err(err) => job = err.into_inner(),
            }
        }
    }

    fn handed_off(&self) {
        self.shared.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        trace!(pool = %self.shared.name, "Task handed to idle worker");
    }

    fn reject(&self, capacity: u32) -> PoolError {
        self.shared.counters.rejected_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(pool = %self.shared.name, capacity, "Pool saturated, rejecting task");
        self.shared.audit(
            None,
            AuditAction::TaskRejected,
            Some(format!("capacity {capacity}")),
        );
        PoolError::CapacitySaturated { capacity }
    }

    /// Start a worker on a reserved slot with `job` as its first task.
    fn start_worker(&self, job: Job, active_workers: u32) -> Result<(), PoolError> {
        let counters = &self.shared.counters;
        counters.busy_workers.fetch_add(1, Ordering::AcqRel);

        match spawn_worker(&self.shared, self.receiver.clone(), job) {
            Ok(name) => {
                counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(pool = %self.shared.name, worker = %name, active_workers, "Task started on new worker");
                Ok(())
            }
            Err(err) => {
                counters.busy_workers.fetch_sub(1, Ordering::AcqRel);
                self.shared.ctl.release();
                counters.rejected_tasks.fetch_add(1, Ordering::Relaxed);
                counters.spawn_failures.fetch_add(1, Ordering::Relaxed);
                error!(pool = %self.shared.name, error = %err, "Failed to allocate worker thread");
                self.shared
                    .audit(None, AuditAction::SpawnFailed, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Apply a new capacity value.
    ///
    /// This is what the registered listener calls; it is public so collaborators
    /// with their own notification plumbing can drive the pool directly. Never
    /// fails: out-of-range values are clamped and logged.
    pub fn on_capacity_change(&self, value: i64) {
        self.shared.apply_capacity(value);
    }

    /// Current capacity ceiling.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.shared.ctl.capacity()
    }

    /// Live worker threads.
    #[must_use]
    pub fn active_workers(&self) -> u32 {
        self.shared.ctl.workers()
    }

    /// How long a worker waits for work before retiring.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.shared.idle_timeout
    }

    /// Pool name, used as the worker thread-name prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.stats()
    }
}

impl Drop for ResizablePool {
    fn drop(&mut self) {
        // Workers are detached; idle ones see the disconnect and exit,
        // busy ones finish their task first.
        debug!(
            pool = %self.shared.name,
            active_workers = self.shared.ctl.workers(),
            "Resizable pool dropped"
        );
    }
}
