//! Common test utilities for driving the router in-process.
//!
//! The fixture wires real SQLite stores and a real catalog directory under a
//! temporary directory, so requests go through the same code paths as in
//! production without a listening socket or a worker.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use seqsearch_core::db::DEFAULT_BUSY_TIMEOUT;
use seqsearch_core::{
    Config, DatabaseCatalog, JobStore, SqlitePendingQueue, SqliteStatusStore, TicketService,
};
use seqsearch_server::{create_router, AppState};

/// Write a `<id>.params` catalog file.
pub fn write_params(dir: &Path, id: &str, name: &str, order: i64) {
    let params = json!({
        "display": { "name": name, "version": "2024", "default": order == 0, "order": order },
        "params": { "sensitivity": 7.5 }
    });
    std::fs::write(dir.join(format!("{}.params", id)), params.to_string())
        .expect("Failed to write params file");
}

/// In-process server over file-backed stores.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new();
/// let response = fixture.get("/api/v1/health").await;
/// assert_eq!(response.status, StatusCode::OK);
/// ```
pub struct TestFixture {
    pub router: Router,
    pub queue: Arc<SqlitePendingQueue>,
    pub status: Arc<SqliteStatusStore>,
    pub job_store: JobStore,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Catalog with `pdb70` and `uniref50`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let databases = temp_dir.path().join("databases");
        let jobs = temp_dir.path().join("jobs");
        std::fs::create_dir_all(&databases).unwrap();
        std::fs::create_dir_all(&jobs).unwrap();
        write_params(&databases, "uniref50", "UniRef50", 1);
        write_params(&databases, "pdb70", "PDB70", 0);

        let db_path = temp_dir.path().join("seqsearch.db");
        let queue = Arc::new(SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap());
        let status = Arc::new(SqliteStatusStore::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap());
        let job_store = JobStore::new(&jobs);
        let catalog = DatabaseCatalog::load(&databases).expect("Failed to load catalog");

        let mut config = Config::default();
        config.database.path = db_path;
        config.paths.databases = databases;
        config.paths.jobs_base = jobs;

        let tickets = TicketService::new(job_store.clone(), status.clone(), queue.clone())
            .with_catalog(catalog);
        let state = Arc::new(AppState::new(
            config,
            tickets,
            queue.clone(),
            status.clone(),
        ));

        Self {
            router: create_router(state),
            queue,
            status,
            job_store,
            temp_dir,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = serde_json::to_vec(&body).unwrap();
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with a raw body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.as_bytes().to_vec()))
            .await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Vec<u8>>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(bytes) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }

    /// Submit a valid job and return its ticket.
    pub async fn submit(&self) -> String {
        let response = self
            .post(
                "/api/v1/ticket",
                json!({
                    "q": ">query\nMKVLAAGIVGLLLA\n",
                    "database": ["pdb70"],
                    "mode": "all",
                    "email": "user@example.org"
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["id"]
            .as_str()
            .expect("ticket id in response")
            .to_string()
    }
}
