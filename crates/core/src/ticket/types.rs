//! Job record and submission types.

use serde::{Deserialize, Serialize};

/// Parameters of a submitted search job.
///
/// Written once at submission time and never modified afterwards. The worker
/// that claims the ticket reads it back exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    /// Query payload (sequences to search).
    pub query: String,

    /// Selected target collections, in submission order. Never empty.
    pub database: Vec<String>,

    /// Execution mode passed through to the pipeline.
    pub mode: String,

    /// Where to send the outcome notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl JobRecord {
    /// Notification address, if one was supplied and is non-blank.
    pub fn notification_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// Selected collections joined into the pipeline's single argument form.
    pub fn database_argument(&self) -> String {
        self.database.join(" ")
    }
}

/// Request to submit a new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub query: String,
    pub database: Vec<String>,
    pub mode: String,
    pub email: Option<String>,
}

impl SubmitRequest {
    pub fn new(query: impl Into<String>, database: Vec<String>, mode: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            database,
            mode: mode.into(),
            email: None,
        }
    }

    /// Ask for an outcome notification at `email`.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub(crate) fn into_record(self) -> JobRecord {
        JobRecord {
            query: self.query,
            database: self.database,
            mode: self.mode,
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        }
    }
}
