//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use prometheus_io_pool::config::pool::{
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_THREAD_PREFIX, IDLE_TIMEOUT_ENV, IO_THREADS_ENV,
    STACK_SIZE_ENV, THREAD_PREFIX_ENV,
};
use prometheus_io_pool::config::{PoolConfig, SchedulerConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_pool_config_defaults() {
    let config = PoolConfig::new();
    assert_eq!(config.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    assert_eq!(config.idle_timeout(), Duration::from_secs(60));
    assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_PREFIX);
    assert_eq!(config.thread_stack_size, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_pool_config_builders() {
    let config = PoolConfig::new()
        .with_idle_timeout(Duration::from_millis(250))
        .with_thread_name_prefix("cassandra-io")
        .with_thread_stack_size(256 * 1024);
    assert_eq!(config.idle_timeout_ms, 250);
    assert_eq!(config.thread_name_prefix, "cassandra-io");
    assert_eq!(config.thread_stack_size, Some(256 * 1024));
}

#[test]
fn test_pool_config_invalid_timeout() {
    let invalid = PoolConfig {
        idle_timeout_ms: 0,
        ..PoolConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_prefix() {
    assert!(PoolConfig::new().with_thread_name_prefix("").validate().is_err());
    assert!(PoolConfig::new().with_thread_name_prefix("io\0pool").validate().is_err());
}

#[test]
fn test_pool_config_invalid_stack_size() {
    assert!(PoolConfig::new().with_thread_stack_size(0).validate().is_err());
}

#[test]
fn test_scheduler_config_negative_threads() {
    let config = SchedulerConfig {
        io_threads: -1,
        pool: PoolConfig::default(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_default_threads_positive() {
    let config = SchedulerConfig::default();
    assert!(config.io_threads > 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "io_threads": 16,
        "pool": {
            "idle_timeout_ms": 30000,
            "thread_name_prefix": "RxCassandraIOThreadPool",
            "thread_stack_size": 1048576
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.io_threads, 16);
    assert_eq!(config.pool.idle_timeout_ms, 30_000);
    assert_eq!(config.pool.thread_name_prefix, "RxCassandraIOThreadPool");
    assert_eq!(config.pool.thread_stack_size, Some(1_048_576));
}

#[test]
fn test_scheduler_config_from_json_partial() {
    let config = SchedulerConfig::from_json_str(r#"{ "io_threads": 2 }"#).unwrap();
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.pool, PoolConfig::default());
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "io_threads": -4 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_from_lookup() {
    let config = SchedulerConfig::from_lookup(lookup(&[
        (IO_THREADS_ENV, " 24 "),
        (IDLE_TIMEOUT_ENV, "5000"),
        (THREAD_PREFIX_ENV, "env-io"),
        (STACK_SIZE_ENV, "524288"),
    ]))
    .unwrap();

    assert_eq!(config.io_threads, 24);
    assert_eq!(config.pool.idle_timeout(), Duration::from_secs(5));
    assert_eq!(config.pool.thread_name_prefix, "env-io");
    assert_eq!(config.pool.thread_stack_size, Some(524_288));
}

#[test]
fn test_scheduler_config_from_lookup_defaults() {
    let config = SchedulerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, SchedulerConfig::default());
}

#[test]
fn test_scheduler_config_from_lookup_errors() {
    let err = SchedulerConfig::from_lookup(lookup(&[(IO_THREADS_ENV, "many")])).unwrap_err();
    assert!(err.to_string().contains(IO_THREADS_ENV));

    assert!(SchedulerConfig::from_lookup(lookup(&[(IDLE_TIMEOUT_ENV, "0")])).is_err());
    assert!(SchedulerConfig::from_lookup(lookup(&[(IO_THREADS_ENV, "-3")])).is_err());
}
