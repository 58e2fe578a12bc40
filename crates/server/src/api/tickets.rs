//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use seqsearch_core::{CatalogError, SubmitRequest, TicketError, TicketInfo};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a search job
#[derive(Debug, Deserialize)]
pub struct SubmitTicketBody {
    /// Query sequences (FASTA)
    pub q: String,
    /// Selected databases
    pub database: Vec<String>,
    pub mode: String,
    /// Notification address
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body for a batch status query
#[derive(Debug, Deserialize)]
pub struct TicketsBody {
    pub tickets: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TicketErrorResponse>);

fn error_response(e: TicketError) -> ApiError {
    let status = match &e {
        TicketError::InvalidTicket(_)
        | TicketError::InvalidRequest(_)
        | TicketError::Catalog(CatalogError::UnknownDatabase(_)) => StatusCode::BAD_REQUEST,
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, "Ticket request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(TicketErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new search job
pub async fn submit_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitTicketBody>,
) -> Result<(StatusCode, Json<TicketInfo>), ApiError> {
    let mut request = SubmitRequest::new(body.q, body.database, body.mode);
    if let Some(email) = body.email {
        request = request.with_email(email);
    }

    let info = state.tickets().submit(request).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// Get the status of one ticket
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket): Path<String>,
) -> Result<Json<TicketInfo>, ApiError> {
    state
        .tickets()
        .status(&ticket)
        .map(Json)
        .map_err(error_response)
}

/// Get the status of several tickets. Unknown tickets are left out.
pub async fn get_tickets(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TicketsBody>,
) -> Result<Json<Vec<TicketInfo>>, ApiError> {
    state
        .tickets()
        .statuses(&body.tickets)
        .map(Json)
        .map_err(error_response)
}
