//! Database catalog handler.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use seqsearch_core::DatabaseEntry;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DatabasesResponse {
    pub databases: Vec<DatabaseEntry>,
}

/// List the searchable databases in display order.
pub async fn list_databases(State(state): State<Arc<AppState>>) -> Json<DatabasesResponse> {
    Json(DatabasesResponse {
        databases: state.databases().to_vec(),
    })
}
