//! Submission and status queries.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{JobStore, SubmitRequest, Ticket, TicketError};
use crate::catalog::DatabaseCatalog;
use crate::metrics;
use crate::queue::PendingQueue;
use crate::status::{JobStatus, StatusStore};

static DATABASE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$").unwrap());

static MODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// Public view of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketInfo {
    pub id: Ticket,
    pub status: JobStatus,
}

/// Front door of the queue: accepts jobs and answers status queries.
pub struct TicketService {
    job_store: JobStore,
    status: Arc<dyn StatusStore>,
    queue: Arc<dyn PendingQueue>,
    catalog: Option<DatabaseCatalog>,
}

impl TicketService {
    pub fn new(
        job_store: JobStore,
        status: Arc<dyn StatusStore>,
        queue: Arc<dyn PendingQueue>,
    ) -> Self {
        Self {
            job_store,
            status,
            queue,
            catalog: None,
        }
    }

    /// Reject selections of databases missing from `catalog`.
    pub fn with_catalog(mut self, catalog: DatabaseCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn catalog(&self) -> Option<&DatabaseCatalog> {
        self.catalog.as_ref()
    }

    /// Accept a job.
    ///
    /// The job record is durable before the status is set and before the
    /// ticket becomes visible in the queue, so a worker can never claim a
    /// ticket whose record is still being written.
    pub fn submit(&self, request: SubmitRequest) -> Result<TicketInfo, TicketError> {
        self.validate(&request)?;

        let ticket = Ticket::generate();
        let record = request.into_record();

        self.job_store.write(&ticket, &record)?;
        self.status
            .set_status(ticket.as_str(), JobStatus::Pending, None)?;
        if let Err(e) = self
            .queue
            .enqueue(ticket.as_str(), Utc::now().timestamp_micros())
        {
            // Never leave a PENDING status that no queue entry backs
            let detail = format!("enqueue failed: {}", e);
            if let Err(status_err) =
                self.status
                    .set_status(ticket.as_str(), JobStatus::Error, Some(&detail))
            {
                error!(ticket = %ticket, error = %status_err, "Failed to record job status");
            }
            warn!(ticket = %ticket, error = %e, "Failed to enqueue ticket");
            return Err(e.into());
        }

        metrics::TICKETS_SUBMITTED.inc();
        info!(
            ticket = %ticket,
            databases = %record.database_argument(),
            mode = %record.mode,
            "Ticket submitted"
        );

        Ok(TicketInfo {
            id: ticket,
            status: JobStatus::Pending,
        })
    }

    /// Status of one ticket.
    pub fn status(&self, raw: &str) -> Result<TicketInfo, TicketError> {
        let ticket = Ticket::parse(raw)?;
        match self.status.get_status(ticket.as_str())? {
            Some(entry) => Ok(TicketInfo {
                id: ticket,
                status: entry.status,
            }),
            None => Err(TicketError::NotFound(ticket.to_string())),
        }
    }

    /// Status of several tickets.
    ///
    /// Every identifier is validated before any lookup; one invalid ticket
    /// fails the whole batch. Unknown tickets are left out of the result.
    pub fn statuses<S: AsRef<str>>(&self, raws: &[S]) -> Result<Vec<TicketInfo>, TicketError> {
        let tickets = raws
            .iter()
            .map(|raw| Ticket::parse(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            if let Some(entry) = self.status.get_status(ticket.as_str())? {
                result.push(TicketInfo {
                    id: ticket,
                    status: entry.status,
                });
            }
        }
        Ok(result)
    }

    fn validate(&self, request: &SubmitRequest) -> Result<(), TicketError> {
        if request.query.trim().is_empty() {
            return Err(TicketError::InvalidRequest("query must not be empty".to_string()));
        }

        if request.database.is_empty() {
            return Err(TicketError::InvalidRequest(
                "at least one database must be selected".to_string(),
            ));
        }

        if let Some(bad) = request.database.iter().find(|db| !DATABASE_NAME.is_match(db)) {
            return Err(TicketError::InvalidRequest(format!(
                "invalid database name: {:?}",
                bad.chars().take(64).collect::<String>()
            )));
        }

        if let Some(catalog) = &self.catalog {
            catalog.check_selection(&request.database)?;
        }

        if !MODE.is_match(&request.mode) {
            return Err(TicketError::InvalidRequest(format!(
                "invalid mode: {:?}",
                request.mode.chars().take(64).collect::<String>()
            )));
        }

        if let Some(email) = request.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.contains('@') {
                return Err(TicketError::InvalidRequest(
                    "invalid notification address".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DatabaseEntry;
    use crate::queue::{QueueError, SqlitePendingQueue};
    use crate::status::SqliteStatusStore;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        service: TicketService,
        queue: Arc<SqlitePendingQueue>,
        job_store: JobStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let job_store = JobStore::new(dir.path().join("jobs"));
        let queue = Arc::new(SqlitePendingQueue::in_memory().unwrap());
        let status = Arc::new(SqliteStatusStore::in_memory().unwrap());
        let service = TicketService::new(job_store.clone(), status, queue.clone());
        Fixture {
            _dir: dir,
            service,
            queue,
            job_store,
        }
    }

    struct UnavailableQueue;

    impl PendingQueue for UnavailableQueue {
        fn enqueue(&self, _ticket: &str, _ordering_key: i64) -> Result<(), QueueError> {
            Err(QueueError::Unavailable("database is locked".to_string()))
        }

        fn claim_next(&self) -> Result<Option<String>, QueueError> {
            Ok(None)
        }

        fn len(&self) -> Result<usize, QueueError> {
            Ok(0)
        }
    }

    fn request() -> SubmitRequest {
        SubmitRequest::new(">q\nMKV", vec!["pdb70".to_string()], "all")
    }

    #[test]
    fn test_submit_writes_record_status_and_queue() {
        let f = fixture();
        let info = f
            .service
            .submit(request().with_email("user@example.org"))
            .unwrap();

        assert_eq!(info.status, JobStatus::Pending);
        let record = f.job_store.read(&info.id).unwrap();
        assert_eq!(record.database, vec!["pdb70"]);
        assert_eq!(record.email.as_deref(), Some("user@example.org"));

        assert_eq!(
            f.service.status(info.id.as_str()).unwrap().status,
            JobStatus::Pending
        );
        assert_eq!(
            f.queue.claim_next().unwrap().as_deref(),
            Some(info.id.as_str())
        );
    }

    #[test]
    fn test_submissions_are_queued_in_order() {
        let f = fixture();
        let first = f.service.submit(request()).unwrap();
        let second = f.service.submit(request()).unwrap();

        assert_eq!(
            f.queue.claim_next().unwrap().as_deref(),
            Some(first.id.as_str())
        );
        assert_eq!(
            f.queue.claim_next().unwrap().as_deref(),
            Some(second.id.as_str())
        );
    }

    #[test]
    fn test_enqueue_failure_marks_ticket_error() {
        let dir = TempDir::new().unwrap();
        let status = Arc::new(SqliteStatusStore::in_memory().unwrap());
        let service = TicketService::new(
            JobStore::new(dir.path().join("jobs")),
            status.clone(),
            Arc::new(UnavailableQueue),
        );

        let err = service.submit(request()).unwrap_err();
        assert!(matches!(err, TicketError::Queue(QueueError::Unavailable(_))));

        assert_eq!(status.count_by_status(JobStatus::Pending).unwrap(), 0);
        assert_eq!(status.count_by_status(JobStatus::Error).unwrap(), 1);
    }

    #[test]
    fn test_submit_rejects_empty_query() {
        let f = fixture();
        let result = f.service.submit(SubmitRequest::new("  ", vec!["pdb70".into()], "all"));
        assert!(matches!(result, Err(TicketError::InvalidRequest(_))));
        assert!(f.queue.is_empty().unwrap());
    }

    #[test]
    fn test_submit_rejects_missing_databases() {
        let f = fixture();
        let result = f.service.submit(SubmitRequest::new("ACGT", vec![], "all"));
        assert!(matches!(result, Err(TicketError::InvalidRequest(_))));
    }

    #[test]
    fn test_submit_rejects_unsafe_database_name() {
        let f = fixture();
        for bad in ["../etc", "a b", "", ".hidden"] {
            let result = f
                .service
                .submit(SubmitRequest::new("ACGT", vec![bad.to_string()], "all"));
            assert!(
                matches!(result, Err(TicketError::InvalidRequest(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_submit_rejects_unsafe_mode() {
        let f = fixture();
        let result = f
            .service
            .submit(SubmitRequest::new("ACGT", vec!["pdb70".into()], "all; rm -rf /"));
        assert!(matches!(result, Err(TicketError::InvalidRequest(_))));
    }

    #[test]
    fn test_submit_rejects_bad_email() {
        let f = fixture();
        let result = f.service.submit(request().with_email("not-an-address"));
        assert!(matches!(result, Err(TicketError::InvalidRequest(_))));
    }

    #[test]
    fn test_submit_checks_catalog() {
        let f = fixture();
        let service = f.service.with_catalog(DatabaseCatalog::new(vec![DatabaseEntry {
            id: "pdb70".to_string(),
            name: "PDB70".to_string(),
            version: String::new(),
            default: true,
            order: 0,
        }]));

        assert!(service.submit(request()).is_ok());
        let result = service.submit(SubmitRequest::new("ACGT", vec!["nr".into()], "all"));
        assert!(matches!(result, Err(TicketError::Catalog(_))));
    }

    #[test]
    fn test_status_rejects_traversal_before_lookup() {
        let f = fixture();
        let result = f.service.status("../secret");
        assert!(matches!(result, Err(TicketError::InvalidTicket(_))));
    }

    #[test]
    fn test_status_unknown_ticket() {
        let f = fixture();
        let result = f.service.status("abcdef");
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_statuses_omits_unknown() {
        let f = fixture();
        let info = f.service.submit(request()).unwrap();

        let result = f
            .service
            .statuses(&[info.id.as_str(), "unknown"])
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, info.id);
    }

    #[test]
    fn test_statuses_rejects_any_invalid() {
        let f = fixture();
        let info = f.service.submit(request()).unwrap();

        let result = f.service.statuses(&[info.id.as_str(), "../x"]);
        assert!(matches!(result, Err(TicketError::InvalidTicket(_))));
    }

    #[test]
    fn test_ticket_info_serializes_like_api() {
        let info = TicketInfo {
            id: Ticket::parse("abc").unwrap(),
            status: JobStatus::Running,
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({"id": "abc", "status": "RUNNING"})
        );
    }
}
