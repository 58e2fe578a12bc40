//! Worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the worker loop (`[worker]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker loops in one process.
    /// Each loop runs one job at a time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Backoff after an empty or unavailable queue (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Hard wall-clock limit per job (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How often to fail abandoned RUNNING tickets (seconds, 0 = never).
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// Extra time past the job timeout before a RUNNING ticket counts as
    /// abandoned (seconds).
    #[serde(default = "default_reap_grace")]
    pub reap_grace_secs: u64,

    /// Pass pipeline stdout/stderr through to the worker's own.
    #[serde(default)]
    pub inherit_output: bool,
}

fn default_concurrency() -> usize {
    1
}

fn default_poll_interval() -> u64 {
    100
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_reap_interval() -> u64 {
    300
}

fn default_reap_grace() -> u64 {
    300
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_timeout(),
            reap_interval_secs: default_reap_interval(),
            reap_grace_secs: default_reap_grace(),
            inherit_output: false,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `None` when reaping is disabled.
    pub fn reap_interval(&self) -> Option<Duration> {
        (self.reap_interval_secs > 0).then(|| Duration::from_secs(self.reap_interval_secs))
    }

    /// Age after which a RUNNING ticket is considered abandoned.
    pub fn abandon_after(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.saturating_add(self.reap_grace_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.timeout(), Duration::from_secs(3600));
        assert_eq!(config.reap_interval(), Some(Duration::from_secs(300)));
        assert!(!config.inherit_output);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            concurrency = 4
        "#;
        let config: WorkerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.reap_grace_secs, 300);
    }

    #[test]
    fn test_reaping_can_be_disabled() {
        let config = WorkerConfig {
            reap_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.reap_interval(), None);
    }

    #[test]
    fn test_abandon_after_includes_grace() {
        let config = WorkerConfig {
            timeout_secs: 60,
            reap_grace_secs: 30,
            ..Default::default()
        };
        assert_eq!(config.abandon_after(), Duration::from_secs(90));
    }
}
