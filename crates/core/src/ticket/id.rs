//! Ticket identifiers.
//!
//! A ticket is the only handle a submitter gets for a job, and it ends up in
//! file-system paths (`<jobs_base>/<ticket>/job.json`) and process arguments.
//! [`Ticket`] can therefore only be built through [`Ticket::generate`] or the
//! validity predicate in [`Ticket::parse`].

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::TicketError;

/// Longest accepted ticket identifier.
pub const MAX_TICKET_LEN: usize = 64;

static TICKET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("ticket pattern is valid"));

/// Returns true if `raw` is a well-formed ticket identifier.
///
/// Only ASCII letters, digits, `-` and `_` are accepted, so a valid ticket can
/// never contain a path separator or a `..` component.
pub fn is_valid_ticket(raw: &str) -> bool {
    raw.len() <= MAX_TICKET_LEN && TICKET_PATTERN.is_match(raw)
}

/// Opaque, validated ticket identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticket(String);

impl Ticket {
    /// Issue a fresh ticket (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Validate an externally supplied ticket.
    pub fn parse(raw: &str) -> Result<Self, TicketError> {
        if is_valid_ticket(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TicketError::InvalidTicket(truncate_for_display(raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keeps error messages bounded when someone sends a megabyte "ticket".
fn truncate_for_display(raw: &str) -> String {
    if raw.chars().count() <= MAX_TICKET_LEN {
        raw.to_string()
    } else {
        let head: String = raw.chars().take(MAX_TICKET_LEN).collect();
        format!("{}...", head)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticket {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticket {
    type Error = TicketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_ticket(&value) {
            Ok(Self(value))
        } else {
            Err(TicketError::InvalidTicket(truncate_for_display(&value)))
        }
    }
}

impl From<Ticket> for String {
    fn from(ticket: Ticket) -> Self {
        ticket.0
    }
}
