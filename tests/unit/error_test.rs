//! Tests for error types

use prometheus_io_pool::core::{PoolError, TaskError};

#[test]
fn test_capacity_saturated_error() {
    let err = PoolError::CapacitySaturated { capacity: 4 };
    assert_eq!(format!("{}", err), "pool saturated: all 4 workers busy");
}

#[test]
fn test_spawn_failed_error_keeps_source() {
    let err = PoolError::SpawnFailed {
        name: "RxIoThreadPool-9".to_string(),
        source: std::io::Error::other("resource temporarily unavailable"),
    };
    assert_eq!(
        format!("{}", err),
        "failed to spawn worker thread `RxIoThreadPool-9`: resource temporarily unavailable"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_invalid_capacity_error() {
    let err = PoolError::InvalidCapacityValue { value: -2, clamped: 0 };
    assert_eq!(format!("{}", err), "invalid capacity value -2, clamped to 0");
}

#[test]
fn test_task_execution_failure_error() {
    let err = PoolError::TaskExecutionFailure {
        worker: "io-1".to_string(),
        message: "timeout talking to backend".to_string(),
    };
    assert_eq!(format!("{}", err), "task failed on worker `io-1`: timeout talking to backend");
}

#[test]
fn test_task_error() {
    assert_eq!(format!("{}", TaskError::Aborted), "task aborted before producing a result");
}
