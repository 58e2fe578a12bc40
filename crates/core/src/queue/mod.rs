//! Durable pending queue of tickets awaiting execution.
//!
//! Any number of worker processes may poll the same queue. A claim removes and
//! returns exactly one entry in a single atomic step, so an entry is handed to
//! at most one worker.

mod sqlite;

pub use sqlite::SqlitePendingQueue;

use thiserror::Error;

/// Errors from the pending queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store could not be reached (locked, I/O failure, ...).
    /// Workers treat this like an empty queue and retry after backing off.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// Ordered, multi-consumer-safe queue of ticket identifiers.
pub trait PendingQueue: Send + Sync {
    /// Append a ticket. Entries with equal ordering keys keep insertion order.
    fn enqueue(&self, ticket: &str, ordering_key: i64) -> Result<(), QueueError>;

    /// Remove and return the entry with the smallest ordering key.
    ///
    /// Returns `Ok(None)` immediately when the queue is empty. The returned
    /// value is the raw stored string; callers validate it before use.
    fn claim_next(&self) -> Result<Option<String>, QueueError>;

    /// Number of entries currently waiting.
    fn len(&self) -> Result<usize, QueueError>;

    fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }
}
