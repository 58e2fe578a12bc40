//! Tests that run the `seqsearch` binary as a separate process.

use std::net::TcpListener;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

use seqsearch_core::db::DEFAULT_BUSY_TIMEOUT;
use seqsearch_core::{
    JobStatus, JobStore, PendingQueue, SqlitePendingQueue, SqliteStatusStore, StatusStore,
    SubmitRequest, TicketService,
};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Lay out databases, jobs and a pipeline under `dir` and write a config.
fn write_layout(dir: &Path, port: u16, with_catalog: bool) -> std::path::PathBuf {
    let databases = dir.join("databases");
    let jobs = dir.join("jobs");
    std::fs::create_dir_all(&databases).unwrap();
    std::fs::create_dir_all(&jobs).unwrap();

    if with_catalog {
        let params = json!({
            "display": { "name": "PDB70", "version": "2024", "default": true, "order": 0 },
            "params": {}
        });
        std::fs::write(databases.join("pdb70.params"), params.to_string()).unwrap();
    }

    let pipeline = dir.join("run_job.sh");
    std::fs::write(&pipeline, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&pipeline, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let config = format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[database]
path = "{db}"

[paths]
databases = "{databases}"
jobs_base = "{jobs}"
pipeline = "{pipeline}"

[worker]
poll_interval_ms = 20
timeout_secs = 30
"#,
        port = port,
        db = dir.join("seqsearch.db").display(),
        databases = databases.display(),
        jobs = jobs.display(),
        pipeline = pipeline.display(),
    );

    let config_path = dir.join("config.toml");
    std::fs::write(&config_path, config).unwrap();
    config_path
}

/// Spawn the binary and return a handle
fn spawn_server(config_path: &Path, mode: &str) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_seqsearch"))
        .arg(mode)
        .env("SEQSEARCH_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Run the binary to completion, failing the test if it hangs.
async fn run_to_exit(config_path: &Path, mode: &str) -> Output {
    timeout(
        Duration::from_secs(10),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_seqsearch"))
            .arg(mode)
            .env("SEQSEARCH_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .kill_on_drop(true)
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_serve_mode_answers_health_and_databases() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = write_layout(dir.path(), port, true);

    let mut server = spawn_server(&config_path, "serve");
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health: Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let databases: Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/databases", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(databases["databases"][0]["id"], "pdb70");

    server.kill().await.ok();
}

#[cfg(unix)]
#[tokio::test]
async fn test_all_mode_runs_submitted_job_to_completion() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = write_layout(dir.path(), port, true);

    let mut server = spawn_server(&config_path, "all");
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let submitted: Value = client
        .post(format!("http://127.0.0.1:{}/api/v1/ticket", port))
        .json(&json!({ "q": ">q\nMKV\n", "database": ["pdb70"], "mode": "all" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = submitted["id"].as_str().expect("ticket id").to_string();

    let mut status = Value::Null;
    for _ in 0..200 {
        let response: Value = client
            .get(format!("http://127.0.0.1:{}/api/v1/ticket/{}", port, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        status = response["status"].clone();
        if status == "COMPLETED" {
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(status, "COMPLETED");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = run_to_exit(Path::new("/nonexistent/config.toml"), "serve").await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_empty_catalog_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let config_path = write_layout(dir.path(), get_available_port(), false);

    let result = run_to_exit(&config_path, "serve").await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_unknown_mode_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let config_path = write_layout(dir.path(), get_available_port(), true);

    let result = run_to_exit(&config_path, "everything").await;
    assert!(!result.status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_bind_failure_in_all_mode_leaves_queue_untouched() {
    let dir = TempDir::new().unwrap();
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();
    let config_path = write_layout(dir.path(), port, true);

    let db_path = dir.path().join("seqsearch.db");
    let queue = Arc::new(SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap());
    let status = Arc::new(SqliteStatusStore::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap());
    let jobs = JobStore::new(dir.path().join("jobs"));
    let service = TicketService::new(jobs, status.clone(), queue.clone());
    let ticket = service
        .submit(SubmitRequest::new("ACGT", vec!["pdb70".to_string()], "all"))
        .unwrap()
        .id;

    let result = run_to_exit(&config_path, "all").await;
    assert!(!result.status.success());

    // no worker ran, so the job is still waiting rather than stuck RUNNING
    let entry = status.get_status(ticket.as_str()).unwrap().unwrap();
    assert_eq!(entry.status, JobStatus::Pending);
    assert_eq!(queue.len().unwrap(), 1);

    drop(occupied);
}
