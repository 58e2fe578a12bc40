use std::path::PathBuf;
use std::time::Duration;

use crate::notify::NotificationKind;
use crate::status::JobStatus;

/// Classified result of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Pipeline exited with code 0.
    Success,
    /// The pipeline process could not be started.
    LaunchError(String),
    /// Non-zero exit, killed by a signal, or waiting on it failed.
    RuntimeError(String),
    /// The wall-clock deadline passed first; the process was killed.
    Timeout,
}

impl Outcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::LaunchError(_) => "launch_error",
            Outcome::RuntimeError(_) => "runtime_error",
            Outcome::Timeout => "timeout",
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Outcome::Success => JobStatus::Completed,
            _ => JobStatus::Error,
        }
    }

    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Outcome::Success => NotificationKind::Success,
            Outcome::Timeout => NotificationKind::Timeout,
            Outcome::LaunchError(_) | Outcome::RuntimeError(_) => NotificationKind::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Static inputs of every pipeline invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Pipeline executable (script) to launch.
    pub pipeline: PathBuf,
    /// Search tool passed to the pipeline as its first argument.
    pub tool: PathBuf,
    pub jobs_base: PathBuf,
    pub databases: PathBuf,
    /// Hard wall-clock limit per job.
    pub timeout: Duration,
    /// Pass the pipeline's stdout/stderr through instead of discarding them.
    pub inherit_output: bool,
}
