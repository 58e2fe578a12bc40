use std::sync::Arc;

use crate::notify::{DispatchResult, NotificationDispatcher};
use crate::queue::PendingQueue;
use crate::runner::{ExecutionRunner, Outcome};
use crate::status::{JobStatus, StatusStore};
use crate::ticket::{JobStore, Ticket};

/// Detail recorded for RUNNING tickets failed by the reaper.
pub const ABANDONED_DETAIL: &str = "abandoned by worker";

/// What one worker iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The queue was empty.
    Idle,
    /// The queue could not be read.
    Unavailable,
    /// A claimed entry failed ticket validation and was dropped.
    InvalidTicket(String),
    /// The job record was missing or unreadable; the ticket is now ERROR.
    RecordFailed(Ticket),
    /// The ticket was not PENDING when claimed (a duplicate queue entry of
    /// a ticket that already ran or is running). Nothing was executed.
    NotPending {
        ticket: Ticket,
        status: Option<JobStatus>,
    },
    /// The pipeline ran to an outcome.
    Executed {
        ticket: Ticket,
        outcome: Outcome,
        notification: DispatchResult,
    },
}

impl TickOutcome {
    /// Whether the worker should back off before the next claim.
    pub fn should_back_off(&self) -> bool {
        matches!(self, TickOutcome::Idle | TickOutcome::Unavailable)
    }
}

/// Components shared by every worker in a process.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<dyn PendingQueue>,
    pub status: Arc<dyn StatusStore>,
    pub job_store: JobStore,
    pub runner: Arc<ExecutionRunner>,
    pub dispatcher: Arc<NotificationDispatcher>,
}
