//! Tests for audit sink

use prometheus_io_pool::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "RxIoThreadPool",
        Some("RxIoThreadPool-1"),
        AuditAction::WorkerSpawned,
        None,
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].worker.as_deref(), Some("RxIoThreadPool-1"));
    assert_eq!(events[0].action, AuditAction::WorkerSpawned);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("pool1", None, AuditAction::TaskRejected, Some("a".into())));
    sink.record(build_audit_event("pool1", None, AuditAction::TaskRejected, Some("b".into())));
    sink.record(build_audit_event("pool1", None, AuditAction::CapacityChanged, Some("c".into())));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].detail.as_deref(), Some("b")); // First one popped
    assert_eq!(events[1].detail.as_deref(), Some("c"));
    assert_eq!(sink.count(AuditAction::TaskRejected), 1);
}

#[test]
fn test_zero_sized_sink_keeps_nothing() {
    let sink = InMemoryAuditSink::new(0);

    sink.record(build_audit_event("pool1", None, AuditAction::TaskRejected, None));
    sink.record(build_audit_event("pool1", None, AuditAction::SpawnFailed, None));

    assert!(sink.events().is_empty());
    assert_eq!(sink.count(AuditAction::TaskRejected), 0);
}

#[test]
fn test_build_audit_event() {
    let first = build_audit_event("pool1", None, AuditAction::CapacityChanged, Some("2 -> 5".into()));
    let second = build_audit_event("pool1", None, AuditAction::CapacityChanged, None);

    assert_eq!(first.pool, "pool1");
    assert_eq!(first.worker, None);
    assert_eq!(first.detail.as_deref(), Some("2 -> 5"));
    assert!(first.created_at_ms > 0);
    assert_ne!(first.event_id, second.event_id);
}

#[test]
fn test_audit_event_serializes_snake_case_action() {
    let event = build_audit_event("pool1", Some("pool1-3"), AuditAction::WorkerRetired, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "worker_retired");
    assert_eq!(json["worker"], "pool1-3");
}
