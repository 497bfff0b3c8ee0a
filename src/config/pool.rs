//! Pool and scheduler configuration structures.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable holding the initial IO thread count.
pub const IO_THREADS_ENV: &str = "PROMETHEUS_IO_THREADS";
/// Environment variable holding the worker idle timeout in milliseconds.
pub const IDLE_TIMEOUT_ENV: &str = "PROMETHEUS_IO_IDLE_TIMEOUT_MS";
/// Environment variable holding the worker thread-name prefix.
pub const THREAD_PREFIX_ENV: &str = "PROMETHEUS_IO_THREAD_PREFIX";
/// Environment variable holding the worker stack size in bytes.
pub const STACK_SIZE_ENV: &str = "PROMETHEUS_IO_STACK_SIZE";

/// Default idle timeout before a worker retires.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 60_000;
/// Default worker thread-name prefix.
pub const DEFAULT_THREAD_PREFIX: &str = "RxIoThreadPool";

/// Static settings of one resizable pool.
///
/// The capacity ceiling is deliberately absent: it comes from a live
/// [`CapacitySource`](crate::core::CapacitySource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Milliseconds a worker waits for work before retiring.
    pub idle_timeout_ms: u64,
    /// Worker threads are named `{prefix}-{sequence}`.
    pub thread_name_prefix: String,
    /// Worker stack size in bytes; platform default when unset.
    pub thread_stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_owned(),
            thread_stack_size: None,
        }
    }
}

impl PoolConfig {
    /// Configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the worker thread-name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = Some(size);
        self
    }

    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_timeout_ms == 0 {
            return Err("idle_timeout_ms must be greater than 0".into());
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.thread_name_prefix.contains('\0') {
            return Err("thread_name_prefix must not contain null bytes".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration: the initial IO thread count plus pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Initial capacity ceiling; later changes arrive through the capacity source.
    #[serde(default = "default_io_threads")]
    pub io_threads: i64,
    /// Pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_io_threads() -> i64 {
    i64::try_from(num_cpus::get().saturating_mul(4)).unwrap_or(i64::MAX)
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            io_threads: default_io_threads(),
            pool: PoolConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Validate the IO thread count and pool settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.io_threads < 0 {
            return Err(format!("io_threads must not be negative, got {}", self.io_threads));
        }
        if u32::try_from(self.io_threads).is_err() {
            return Err(format!("io_threads out of range: {}", self.io_threads));
        }
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env` file
    /// first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable does not parse or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Fails if a value does not parse or the result does not validate.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(IO_THREADS_ENV) {
            cfg.io_threads = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{IO_THREADS_ENV}={raw:?} is not an integer"))?;
        }
        if let Some(raw) = lookup(IDLE_TIMEOUT_ENV) {
            cfg.pool.idle_timeout_ms = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{IDLE_TIMEOUT_ENV}={raw:?} is not a millisecond count"))?;
        }
        if let Some(raw) = lookup(THREAD_PREFIX_ENV) {
            cfg.pool.thread_name_prefix = raw;
        }
        if let Some(raw) = lookup(STACK_SIZE_ENV) {
            cfg.pool.thread_stack_size = Some(
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("{STACK_SIZE_ENV}={raw:?} is not a byte count"))?,
            );
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
