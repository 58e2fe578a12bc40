//! Bounded-time execution of the external search pipeline.

mod types;

pub use types::*;

use std::ffi::OsString;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{error, info, warn};

use crate::metrics;
use crate::status::{JobStatus, StatusStore};
use crate::ticket::{JobRecord, Ticket};

/// How long to wait for a killed pipeline to be reaped.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Launches the pipeline for one job at a time and classifies the result.
pub struct ExecutionRunner {
    config: RunnerConfig,
    status: Arc<dyn StatusStore>,
}

impl ExecutionRunner {
    pub fn new(config: RunnerConfig, status: Arc<dyn StatusStore>) -> Self {
        Self { config, status }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Positional arguments for the pipeline:
    /// `<tool> <jobs_base> <ticket> <databases> "<db1 db2 ...>" <mode>`.
    pub fn build_args(&self, ticket: &Ticket, job: &JobRecord) -> Vec<OsString> {
        vec![
            self.config.tool.clone().into_os_string(),
            self.config.jobs_base.clone().into_os_string(),
            OsString::from(ticket.as_str()),
            self.config.databases.clone().into_os_string(),
            OsString::from(job.database_argument()),
            OsString::from(&job.mode),
        ]
    }

    /// Execute `job` and record its terminal status.
    ///
    /// The status is `RUNNING` while the pipeline runs and `COMPLETED` or
    /// `ERROR` once this returns. Status write failures are logged; the
    /// outcome is returned regardless.
    pub async fn run(&self, ticket: &Ticket, job: &JobRecord) -> Outcome {
        self.write_status(ticket, JobStatus::Running, None);

        let started = Instant::now();
        let outcome = self.execute(ticket, job).await;
        let elapsed = started.elapsed();

        let detail = self.detail_for(&outcome);
        self.write_status(ticket, outcome.status(), detail.as_deref());

        metrics::JOB_OUTCOMES
            .with_label_values(&[outcome.label()])
            .inc();
        metrics::JOB_DURATION
            .with_label_values(&[outcome.label()])
            .observe(elapsed.as_secs_f64());

        match &outcome {
            Outcome::Success => info!(
                ticket = %ticket,
                elapsed_secs = elapsed.as_secs(),
                "Job completed"
            ),
            other => warn!(
                ticket = %ticket,
                outcome = other.label(),
                detail = detail.as_deref().unwrap_or(""),
                elapsed_secs = elapsed.as_secs(),
                "Job failed"
            ),
        }

        outcome
    }

    async fn execute(&self, ticket: &Ticket, job: &JobRecord) -> Outcome {
        let mut command = Command::new(&self.config.pipeline);
        command
            .args(self.build_args(ticket, job))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if self.config.inherit_output {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Outcome::LaunchError(format!(
                    "failed to start {}: {}",
                    self.config.pipeline.display(),
                    e
                ));
            }
        };

        info!(
            ticket = %ticket,
            pid = child.id().unwrap_or_default(),
            "Pipeline started"
        );

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(self.config.timeout) => None,
        };

        match exited {
            Some(Ok(status)) if status.success() => Outcome::Success,
            Some(Ok(status)) => Outcome::RuntimeError(status.to_string()),
            Some(Err(e)) => Outcome::RuntimeError(format!("failed to wait for pipeline: {}", e)),
            None => {
                terminate(ticket, &mut child).await;
                Outcome::Timeout
            }
        }
    }

    fn detail_for(&self, outcome: &Outcome) -> Option<String> {
        match outcome {
            Outcome::Success => None,
            Outcome::LaunchError(details) | Outcome::RuntimeError(details) => {
                Some(details.clone())
            }
            Outcome::Timeout => Some(format!("timeout after {}s", self.config.timeout.as_secs())),
        }
    }

    fn write_status(&self, ticket: &Ticket, status: JobStatus, detail: Option<&str>) {
        if let Err(e) = self.status.set_status(ticket.as_str(), status, detail) {
            error!(
                ticket = %ticket,
                status = %status,
                error = %e,
                "Failed to record job status"
            );
        }
    }
}

/// Best-effort kill followed by a bounded reap.
async fn terminate(ticket: &Ticket, child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(ticket = %ticket, error = %e, "Failed to kill timed-out pipeline");
        return;
    }

    match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(ticket = %ticket, error = %e, "Failed to reap killed pipeline"),
        Err(_) => warn!(ticket = %ticket, "Killed pipeline did not exit in time"),
    }
}
