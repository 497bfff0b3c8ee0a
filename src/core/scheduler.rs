//! Scheduler facade over a [`ResizablePool`].
//!
//! Collaborators get one capability: hand a unit of work to the pool. `schedule`
//! is fire-and-forget; `spawn` additionally returns a [`TaskHandle`] that can be
//! awaited from async code or waited on from a plain thread.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::worker_pool::{Job, Runnable};
use super::{PoolError, PoolStats, ResizablePool, TaskError};

/// Cheaply cloneable handle for submitting work to a shared pool.
#[derive(Clone)]
pub struct Scheduler {
    pool: Arc<ResizablePool>,
}

impl Scheduler {
    /// Wrap a pool.
    #[must_use]
    pub fn new(pool: ResizablePool) -> Self {
        Self::from_shared(Arc::new(pool))
    }

    /// Wrap a pool that is already shared.
    #[must_use]
    pub const fn from_shared(pool: Arc<ResizablePool>) -> Self {
        Self { pool }
    }

    /// Submit a task whose completion the caller tracks on its own.
    ///
    /// # Errors
    ///
    /// Propagates `PoolError::CapacitySaturated` and `PoolError::SpawnFailed`
    /// from [`ResizablePool::submit`].
    pub fn schedule<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit(task)
    }

    /// Submit a task and get a handle to its return value.
    ///
    /// # Errors
    ///
    /// Propagates `PoolError::CapacitySaturated` and `PoolError::SpawnFailed`
    /// from [`ResizablePool::submit`]. A rejected task is dropped without running.
    pub fn spawn<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.submit_job(Job::from_runnable(Deliver {
            task: Some(task),
            value: None,
            tx,
        }))?;
        Ok(TaskHandle { rx })
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<ResizablePool> {
        &self.pool
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

/// Task body plus its result channel. The value is sent from `complete`, after
/// the worker has left the busy state, so a caller woken by the handle can
/// resubmit straight away.
struct Deliver<F, T> {
    task: Option<F>,
    value: Option<T>,
    tx: oneshot::Sender<T>,
}

impl<F, T> Runnable for Deliver<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    fn run(&mut self) {
        if let Some(task) = self.task.take() {
            self.value = Some(task());
        }
    }

    fn complete(self: Box<Self>) {
        let Self { value, tx, .. } = *self;
        // No value means the task panicked; dropping `tx` aborts the handle.
        if let Some(value) = value {
            // The receiver may have been dropped; the result is simply discarded.
            let _ = tx.send(value);
        }
    }
}

/// Result of a task started with [`Scheduler::spawn`].
///
/// Resolves to [`TaskError::Aborted`] if the task panicked. Dropping the handle
/// does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block the current thread until the task finishes.
    ///
    /// Must not be called from inside an async runtime; await the handle there.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Aborted` if the task ended without a value.
    pub fn wait(self) -> Result<T, TaskError> {
        self.rx.blocking_recv().map_err(|_| TaskError::Aborted)
    }

    /// Take the value if the task already finished.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Aborted` if the task ended without a value.
    pub fn try_take(&mut self) -> Result<Option<T>, TaskError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(TaskError::Aborted),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.map_err(|_| TaskError::Aborted))
    }
}
