//! The worker control loop: claim, load, execute, record, notify.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, error, info, warn};

use super::{TickOutcome, WorkerConfig, WorkerContext, ABANDONED_DETAIL};
use crate::metrics;
use crate::status::JobStatus;
use crate::ticket::Ticket;

/// Upper bound for the reaper's age threshold (ten years).
const MAX_ABANDON_SECS: u64 = 10 * 365 * 24 * 3600;

/// A single sequential worker. Runs at most one job at a time.
pub struct Worker {
    id: usize,
    context: WorkerContext,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(id: usize, context: WorkerContext, config: WorkerConfig) -> Self {
        Self {
            id,
            context,
            config,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run until `shutdown` fires.
    ///
    /// Shutdown is only observed between tickets: a job in flight runs to
    /// completion (or its deadline) and gets its terminal status first.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(worker = self.id, "Worker started");

        let reap_interval = self.config.reap_interval();
        let mut last_reap: Option<Instant> = None;

        loop {
            if let Some(interval) = reap_interval {
                if last_reap.is_none_or(|at| at.elapsed() >= interval) {
                    self.reap_abandoned();
                    last_reap = Some(Instant::now());
                }
            }

            let outcome = self.tick().await;

            if outcome.should_back_off() {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!(worker = self.id, "Worker received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(self.config.poll_interval()) => {}
                }
            } else {
                match shutdown.try_recv() {
                    Err(TryRecvError::Empty) => {}
                    _ => {
                        info!(worker = self.id, "Worker received shutdown signal");
                        break;
                    }
                }
            }
        }

        info!(worker = self.id, "Worker stopped");
    }

    /// Perform exactly one iteration of the loop.
    pub async fn tick(&self) -> TickOutcome {
        let raw = match self.context.queue.claim_next() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(worker = self.id, "Queue empty");
                return TickOutcome::Idle;
            }
            Err(e) => {
                metrics::QUEUE_CLAIM_ERRORS.inc();
                warn!(worker = self.id, error = %e, "Failed to claim from queue");
                return TickOutcome::Unavailable;
            }
        };
        metrics::JOBS_CLAIMED.inc();

        let ticket = match Ticket::parse(&raw) {
            Ok(ticket) => ticket,
            Err(e) => {
                metrics::INVALID_TICKETS.inc();
                warn!(worker = self.id, error = %e, "Dropping invalid queue entry");
                return TickOutcome::InvalidTicket(raw);
            }
        };

        info!(worker = self.id, ticket = %ticket, "Claimed ticket");

        let job = match self.context.job_store.read(&ticket) {
            Ok(job) => job,
            Err(e) => {
                let status = self.current_status(&ticket);
                if status.is_some_and(|s| s.is_terminal()) {
                    return self.skip_not_pending(ticket, status);
                }
                warn!(
                    worker = self.id,
                    ticket = %ticket,
                    error = %e,
                    "Failed to load job record"
                );
                let detail = e.to_string();
                let recorded =
                    self.context
                        .status
                        .set_status(ticket.as_str(), JobStatus::Error, Some(&detail));
                if let Err(e) = recorded {
                    error!(ticket = %ticket, error = %e, "Failed to record job status");
                }
                return TickOutcome::RecordFailed(ticket);
            }
        };

        match self.context.status.begin_running(ticket.as_str()) {
            Ok(true) => {}
            Ok(false) => {
                let status = self.current_status(&ticket);
                return self.skip_not_pending(ticket, status);
            }
            // The entry is already out of the queue; running it is the only
            // way it gets a terminal status.
            Err(e) => {
                warn!(
                    worker = self.id,
                    ticket = %ticket,
                    error = %e,
                    "Failed to mark ticket running"
                );
            }
        }

        let outcome = self.context.runner.run(&ticket, &job).await;

        let notification = self
            .context
            .dispatcher
            .dispatch(
                outcome.notification_kind(),
                ticket.as_str(),
                job.notification_address(),
            )
            .await;

        TickOutcome::Executed {
            ticket,
            outcome,
            notification,
        }
    }

    fn current_status(&self, ticket: &Ticket) -> Option<JobStatus> {
        match self.context.status.get_status(ticket.as_str()) {
            Ok(entry) => entry.map(|entry| entry.status),
            Err(e) => {
                warn!(worker = self.id, ticket = %ticket, error = %e, "Failed to read status");
                None
            }
        }
    }

    fn skip_not_pending(&self, ticket: Ticket, status: Option<JobStatus>) -> TickOutcome {
        metrics::DUPLICATE_CLAIMS.inc();
        warn!(
            worker = self.id,
            ticket = %ticket,
            status = ?status,
            "Skipping ticket that is not pending"
        );
        TickOutcome::NotPending { ticket, status }
    }

    /// Fail RUNNING tickets that no live worker can still be executing.
    ///
    /// Returns the number of tickets moved to ERROR.
    pub fn reap_abandoned(&self) -> usize {
        let age = self.config.abandon_after().min(Duration::from_secs(MAX_ABANDON_SECS));
        let cutoff = Utc::now() - chrono::Duration::seconds(age.as_secs() as i64);

        match self
            .context
            .status
            .fail_stale_running(cutoff, ABANDONED_DETAIL)
        {
            Ok(tickets) => {
                for ticket in &tickets {
                    warn!(worker = self.id, ticket = %ticket, "Failed abandoned ticket");
                }
                metrics::TICKETS_REAPED.inc_by(tickets.len() as u64);
                tickets.len()
            }
            Err(e) => {
                warn!(worker = self.id, error = %e, "Failed to reap abandoned tickets");
                0
            }
        }
    }
}
