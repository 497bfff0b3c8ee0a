//! Tests for live capacity values

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use prometheus_io_pool::core::{
    clamp_capacity, CapacitySource, ListenerState, LiveCapacity, PoolError,
};

#[test]
fn test_current_reflects_latest_set() {
    let capacity = LiveCapacity::new(8);
    assert_eq!(capacity.current(), 8);
    capacity.set(3);
    assert_eq!(capacity.current(), 3);
}

#[test]
fn test_every_listener_notified() {
    let capacity = LiveCapacity::new(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    for id in 0..3 {
        let seen = Arc::clone(&seen);
        capacity.subscribe(Box::new(move |v: i64| {
            seen.lock().push((id, v));
            ListenerState::Subscribed
        }));
    }

    capacity.set(6);

    let mut seen = seen.lock().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![(0, 6), (1, 6), (2, 6)]);
}

#[test]
fn test_concurrent_sets_deliver_last_value_last() {
    let capacity = Arc::new(LiveCapacity::new(0));
    let last = Arc::new(Mutex::new(0_i64));
    {
        let last = Arc::clone(&last);
        capacity.subscribe(Box::new(move |v: i64| {
            *last.lock() = v;
            ListenerState::Subscribed
        }));
    }

    let writers: Vec<_> = (1..=8)
        .map(|i| {
            let capacity = Arc::clone(&capacity);
            thread::spawn(move || {
                for n in 0..100 {
                    capacity.set(i * 1000 + n);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(*last.lock(), capacity.get());
}

#[test]
fn test_clamp_capacity_bounds() {
    assert_eq!(clamp_capacity(12).unwrap(), 12);
    assert_eq!(clamp_capacity(i64::from(u32::MAX)).unwrap(), u32::MAX);
    assert!(matches!(
        clamp_capacity(-1),
        Err(PoolError::InvalidCapacityValue { value: -1, clamped: 0 })
    ));
}

#[test]
fn test_only_live_listeners_kept() {
    let capacity = LiveCapacity::new(0);
    let hits = Arc::new(Mutex::new(Vec::new()));
    for id in 0..4_u32 {
        let hits = Arc::clone(&hits);
        capacity.subscribe(Box::new(move |v: i64| {
            hits.lock().push((id, v));
            if id % 2 == 0 {
                ListenerState::Unsubscribed
            } else {
                ListenerState::Subscribed
            }
        }));
    }

    capacity.set(1);
    assert_eq!(capacity.listener_count(), 2);
    capacity.set(2);

    let mut second: Vec<u32> = hits
        .lock()
        .iter()
        .filter(|(_, v)| *v == 2)
        .map(|(id, _)| *id)
        .collect();
    second.sort_unstable();
    assert_eq!(second, vec![1, 3]);
}
