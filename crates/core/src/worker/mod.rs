//! Job workers.
//!
//! Each worker repeatedly claims one ticket from the pending queue, loads its
//! job record, drives the execution runner and dispatches the outcome
//! notification. Workers share nothing but the stores, so any number of them
//! (tasks in a [`WorkerPool`] or separate processes) can poll the same queue.

mod config;
mod job_worker;
mod pool;
mod types;

pub use config::WorkerConfig;
pub use job_worker::Worker;
pub use pool::WorkerPool;
pub use types::{TickOutcome, WorkerContext, ABANDONED_DETAIL};
