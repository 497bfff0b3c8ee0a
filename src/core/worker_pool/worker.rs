//! Worker threads: naming, the execution loop and idle retirement.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use crate::core::audit::AuditAction;
use crate::core::PoolError;

use super::{Job, PoolShared};

/// Spawn a detached worker that runs `first` and then serves the handoff.
///
/// The caller must already hold a worker slot and have counted `first` as busy. Every call consumes a sequence
/// number, so names are never reused even when the spawn fails.
pub(super) fn spawn_worker(
    shared: &Arc<PoolShared>,
    receiver: Receiver<Job>,
    first: Job,
) -> Result<String, PoolError> {
    let sequence = shared.worker_sequence.fetch_add(1, Ordering::Relaxed) + 1;
    let name = format!("{}-{sequence}", shared.name);

    info!(pool = %shared.name, worker = %name, "Allocating new IO thread");

    let mut builder = thread::Builder::new().name(name.clone());
    if let Some(size) = shared.stack_size {
        builder = builder.stack_size(size);
    }

    let worker = Worker {
        name: name.clone(),
        receiver,
        shared: Arc::clone(shared),
    };

    match builder.spawn(move || worker.run(first)) {
        Ok(_detached) => {
            shared.counters.spawned_workers.fetch_add(1, Ordering::Relaxed);
            shared.audit(Some(name.as_str()), AuditAction::WorkerSpawned, None);
            Ok(name)
        }
        Err(source) => Err(PoolError::SpawnFailed { name, source }),
    }
}

struct Worker {
    name: String,
    receiver: Receiver<Job>,
    shared: Arc<PoolShared>,
}

impl Worker {
    fn run(self, first: Job) {
        // Releases the slot however the loop ends.
        let _retirement = Retirement { worker: &self };

        debug!(worker = %self.name, "Worker thread started");
        self.execute(first);

        loop {
            let counters = &self.shared.counters;
            counters.idle_workers.fetch_add(1, Ordering::Relaxed);
            let received = self.receiver.recv_timeout(self.shared.idle_timeout);
            counters.idle_workers.fetch_sub(1, Ordering::Relaxed);

            match received {
                Ok(job) => {
                    counters.busy_workers.fetch_add(1, Ordering::AcqRel);
                    self.execute(job);
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!(worker = %self.name, "Worker idle past timeout, retiring");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(worker = %self.name, "Pool dropped, worker exiting");
                    break;
                }
            }
        }
    }

    /// Run a job the caller already counted as busy.
    fn execute(&self, mut job: Job) {
        let counters = &self.shared.counters;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run()));
        counters.busy_workers.fetch_sub(1, Ordering::AcqRel);

        match outcome {
            Ok(()) => {
                counters.completed_tasks.fetch_add(1, Ordering::Release);
            }
            Err(payload) => {
                counters.failed_tasks.fetch_add(1, Ordering::Release);
                let err = PoolError::TaskExecutionFailure {
                    worker: self.name.clone(),
                    message: panic_message(payload.as_ref()),
                };
                error!(worker = %self.name, error = %err, "Task panicked, worker continues");
                self.shared
                    .audit(Some(self.name.as_str()), AuditAction::TaskFailed, Some(err.to_string()));
            }
        }

        if panic::catch_unwind(AssertUnwindSafe(move || job.complete())).is_err() {
            warn!(worker = %self.name, "Task completion panicked");
        }
    }
}

struct Retirement<'a> {
    worker: &'a Worker,
}

impl Drop for Retirement<'_> {
    fn drop(&mut self) {
        let shared = &self.worker.shared;
        shared.counters.retired_workers.fetch_add(1, Ordering::Relaxed);
        let remaining = shared.ctl.release();
        debug!(worker = %self.worker.name, remaining, "Worker thread retired");
        shared.audit(Some(self.worker.name.as_str()), AuditAction::WorkerRetired, None);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
