//! # Prometheus IO Pool
//!
//! A live-resizable worker pool for blocking, I/O-bound work such as calls into a
//! storage backend.
//!
//! The pool never queues a backlog. Every submission is handed to an idle worker
//! through a zero-capacity rendezvous channel; when no worker is idle a new one is
//! spawned as long as the live capacity ceiling allows it, otherwise the
//! submission is rejected on the spot. The caller owns retry and backoff.
//!
//! ## Key Features
//!
//! - **Live capacity**: the worker ceiling comes from a [`core::CapacitySource`]
//!   and follows every change it publishes
//! - **Immediate growth**: raising capacity lets the very next submission spawn
//! - **Lazy shrink**: lowering capacity never interrupts running work; surplus
//!   workers leave through idle-timeout retirement
//! - **Backpressure**: saturation is an error, not a queue
//! - **Diagnosable threads**: every worker gets a unique, never-reused name
//! - **Panic containment**: a panicking task is logged and audited, the worker
//!   keeps serving
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_io_pool::config::PoolConfig;
//! use prometheus_io_pool::core::{LiveCapacity, ResizablePool, Scheduler};
//!
//! let capacity = Arc::new(LiveCapacity::new(8));
//! let pool = ResizablePool::new(PoolConfig::new(), capacity.as_ref())?;
//! let scheduler = Scheduler::new(pool);
//!
//! // Fire-and-forget
//! scheduler.schedule(|| write_row())?;
//!
//! // Await a result
//! let rows = scheduler.spawn(|| read_rows())?.await?;
//!
//! // Operators can resize at runtime
//! capacity.set(32);
//! ```
//!
//! For complete examples, see:
//! - `tests/worker_pool_test.rs` - Capacity, saturation and retirement scenarios
//! - `tests/scheduler_test.rs` - Result handles and the facade

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool, capacity source, scheduler facade and audit channel.
pub mod core;
/// Configuration models for pools and environment loading.
pub mod config;
/// Builders to construct pools and schedulers from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
