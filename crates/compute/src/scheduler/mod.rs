//! Bounded-concurrency work pool.
//!
//! A fixed set of workers drains one unbounded FIFO queue. Work running on a
//! worker may submit more work through a [`SchedulerHandle`]; the queue grows
//! instead of the call stack, so deep or wide fan-out never blocks a worker.
//! The pool knows nothing about what the work does.

pub mod pool;
pub mod types;

pub use pool::{SchedulerHandle, TaskScheduler};
pub use types::{SchedulerConfig, SchedulerError};
