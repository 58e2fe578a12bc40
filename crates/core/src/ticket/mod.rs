//! Tickets: identifiers, job records and the submission service.

mod id;
mod job_store;
mod service;
mod types;

pub use id::{is_valid_ticket, Ticket, MAX_TICKET_LEN};
pub use job_store::{JobStore, JobStoreError};
pub use service::{TicketInfo, TicketService};
pub use types::{JobRecord, SubmitRequest};

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::queue::QueueError;
use crate::status::StatusError;

/// Errors from submission and status queries.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The identifier failed the validity predicate. Nothing was looked up.
    #[error("Invalid ticket: {0}")]
    InvalidTicket(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    JobStore(#[from] JobStoreError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
