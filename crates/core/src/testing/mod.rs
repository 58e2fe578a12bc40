//! Testing utilities for worker and service tests.
//!
//! Provides a recording mail transport and fixtures for building a complete
//! worker stack on a scratch directory, with shell scripts standing in for
//! the real search pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use seqsearch_core::testing::{fixtures, RecordingNotifier};
//!
//! let dir = tempfile::tempdir()?;
//! let pipeline = fixtures::write_pipeline_script(dir.path(), "ok.sh", "exit 0")?;
//! let env = fixtures::TestEnv::new(dir.path(), &pipeline, Duration::from_secs(5))?;
//! let ticket = env.service.submit(fixtures::submit_request())?.id;
//! let outcome = env.worker().tick().await;
//! ```

mod recording_notifier;

pub use recording_notifier::RecordingNotifier;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use super::RecordingNotifier;
    use crate::db::DEFAULT_BUSY_TIMEOUT;
    use crate::notify::{NotificationDispatcher, NotificationTemplates};
    use crate::queue::SqlitePendingQueue;
    use crate::runner::{ExecutionRunner, RunnerConfig};
    use crate::status::SqliteStatusStore;
    use crate::ticket::{JobRecord, JobStore, SubmitRequest, TicketService};
    use crate::worker::{Worker, WorkerConfig, WorkerContext};

    /// A valid submission with a notification address.
    pub fn submit_request() -> SubmitRequest {
        SubmitRequest::new(">query\nMKVLAAGIVGLLLA\n", vec!["pdb70".to_string()], "all")
            .with_email("user@example.org")
    }

    /// A job record as the submission service would write it.
    pub fn job_record() -> JobRecord {
        JobRecord {
            query: ">query\nMKVLAAGIVGLLLA\n".to_string(),
            database: vec!["pdb70".to_string()],
            mode: "all".to_string(),
            email: Some("user@example.org".to_string()),
        }
    }

    /// Write an executable `/bin/sh` script into `dir` and return its path.
    #[cfg(unix)]
    pub fn write_pipeline_script(dir: &Path, name: &str, body: &str) -> io::Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
        let mut permissions = std::fs::metadata(&path)?.permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions)?;
        Ok(path)
    }

    /// A complete single-process stack on file-backed stores under `base`.
    pub struct TestEnv {
        pub service: TicketService,
        pub context: WorkerContext,
        pub notifier: Arc<RecordingNotifier>,
        pub queue: Arc<SqlitePendingQueue>,
        pub status: Arc<SqliteStatusStore>,
        pub job_store: JobStore,
        pub db_path: PathBuf,
    }

    impl TestEnv {
        pub fn new(base: &Path, pipeline: &Path, timeout: Duration) -> io::Result<Self> {
            let jobs_base = base.join("jobs");
            let databases = base.join("databases");
            std::fs::create_dir_all(&jobs_base)?;
            std::fs::create_dir_all(&databases)?;

            let db_path = base.join("seqsearch.db");
            let queue = Arc::new(
                SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).map_err(io::Error::other)?,
            );
            let status = Arc::new(
                SqliteStatusStore::new(&db_path, DEFAULT_BUSY_TIMEOUT).map_err(io::Error::other)?,
            );
            let job_store = JobStore::new(&jobs_base);
            let notifier = Arc::new(RecordingNotifier::new());

            let runner = ExecutionRunner::new(
                RunnerConfig {
                    pipeline: pipeline.to_path_buf(),
                    tool: PathBuf::from("mmseqs"),
                    jobs_base,
                    databases,
                    timeout,
                    inherit_output: false,
                },
                status.clone(),
            );
            let dispatcher = NotificationDispatcher::new(
                notifier.clone(),
                NotificationTemplates::default(),
                "noreply@example.org",
            );

            let context = WorkerContext {
                queue: queue.clone(),
                status: status.clone(),
                job_store: job_store.clone(),
                runner: Arc::new(runner),
                dispatcher: Arc::new(dispatcher),
            };
            let service = TicketService::new(job_store.clone(), status.clone(), queue.clone());

            Ok(Self {
                service,
                context,
                notifier,
                queue,
                status,
                job_store,
                db_path,
            })
        }

        /// A worker with a short poll interval.
        pub fn worker(&self) -> Worker {
            Worker::new(0, self.context.clone(), self.worker_config())
        }

        pub fn worker_config(&self) -> WorkerConfig {
            WorkerConfig {
                poll_interval_ms: 10,
                timeout_secs: self.context.runner.config().timeout.as_secs().max(1),
                ..Default::default()
            }
        }
    }
}
