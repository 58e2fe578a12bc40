//! Job lifecycle status, readable by any process at any time.

mod sqlite;

pub use sqlite::SqliteStatusStore;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a job.
///
/// `Completed` and `Error` are terminal. Timeouts, launch failures and
/// abnormal exits all end in `Error`; the entry's detail tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "ERROR" => Ok(JobStatus::Error),
            other => Err(StatusError::UnknownStatus(other.to_string())),
        }
    }
}

/// Current status of one ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub ticket: String,
    pub status: JobStatus,
    /// Free-text reason, e.g. `timeout after 3600s` or `exit status: 1`.
    pub detail: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Errors from the status store.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown status value: {0}")]
    UnknownStatus(String),
}

/// Ticket → status mapping.
pub trait StatusStore: Send + Sync {
    /// Unconditionally overwrite the status of `ticket`.
    fn set_status(
        &self,
        ticket: &str,
        status: JobStatus,
        detail: Option<&str>,
    ) -> Result<(), StatusError>;

    /// Current status, or `None` if the ticket was never recorded.
    fn get_status(&self, ticket: &str) -> Result<Option<StatusEntry>, StatusError>;

    /// Move `ticket` from `PENDING` to `RUNNING` in one step.
    ///
    /// Returns `false` when the ticket is not `PENDING` (already running
    /// elsewhere, terminal, or unknown); nothing is written then.
    fn begin_running(&self, ticket: &str) -> Result<bool, StatusError>;

    /// Move every `RUNNING` entry last updated before `older_than` to `ERROR`
    /// in one step. Returns the affected tickets.
    fn fail_stale_running(
        &self,
        older_than: DateTime<Utc>,
        detail: &str,
    ) -> Result<Vec<String>, StatusError>;

    /// Number of tickets currently in `status`.
    fn count_by_status(&self, status: JobStatus) -> Result<usize, StatusError>;
}
