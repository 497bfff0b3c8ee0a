//! Live capacity values and change notification.
//!
//! A [`CapacitySource`] is the pool's only view of its configured ceiling: one
//! synchronous read at construction and a single registered listener after that.
//! [`LiveCapacity`] is the in-process implementation used by builders and tests;
//! configuration systems with their own watch mechanism implement the trait
//! directly.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::PoolError;

/// Whether a listener wants further notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Keep delivering updates.
    Subscribed,
    /// The listener's owner is gone; the source should drop it.
    Unsubscribed,
}

/// Callback invoked with the new value whenever a capacity source changes.
pub type CapacityListener = Box<dyn Fn(i64) -> ListenerState + Send + Sync + 'static>;

/// A live, externally mutable capacity value.
///
/// Values are `i64` so that out-of-range updates reach the pool and get clamped
/// there instead of being silently wrapped by the source.
pub trait CapacitySource: Send + Sync {
    /// Current value.
    fn current(&self) -> i64;

    /// Register a listener called after every update.
    ///
    /// Implementations must deliver notifications in update order so that the
    /// last delivered value equals the last stored one, and should stop
    /// calling a listener once it returns [`ListenerState::Unsubscribed`].
    fn subscribe(&self, listener: CapacityListener);
}

/// Validate a raw capacity value.
///
/// # Errors
///
/// Returns [`PoolError::InvalidCapacityValue`] carrying the clamped value when
/// `value` lies outside `0..=u32::MAX`.
pub fn clamp_capacity(value: i64) -> Result<u32, PoolError> {
    u32::try_from(value).map_err(|_| PoolError::InvalidCapacityValue {
        value,
        clamped: if value < 0 { 0 } else { u32::MAX },
    })
}

/// In-process capacity value with synchronous listener notification.
pub struct LiveCapacity {
    value: AtomicI64,
    listeners: Mutex<Vec<CapacityListener>>,
}

impl LiveCapacity {
    /// Create a value with an initial setting.
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Current value.
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Store a new value and notify listeners if it changed.
    ///
    /// The listener lock is held across the store and the notifications, so
    /// concurrent `set` calls are delivered in the order they were applied.
    /// Listeners must not call back into `set`.
    pub fn set(&self, value: i64) {
        let mut listeners = self.listeners.lock();
        let previous = self.value.swap(value, Ordering::AcqRel);
        if previous == value {
            return;
        }
        debug!(previous, value, listeners = listeners.len(), "Capacity value updated");
        listeners.retain(|listener| listener(value) == ListenerState::Subscribed);
    }

    /// Number of registered listeners. Listeners whose owner is gone are only
    /// removed on the next change.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl CapacitySource for LiveCapacity {
    fn current(&self) -> i64 {
        self.get()
    }

    fn subscribe(&self, listener: CapacityListener) {
        self.listeners.lock().push(listener);
    }
}
