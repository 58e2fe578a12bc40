use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::notify::{MailConfig, MailTransport, NotificationTemplates};
use crate::runner::RunnerConfig;
use crate::worker::WorkerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Runner settings derived from the paths and worker sections.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            pipeline: self.paths.pipeline.clone(),
            tool: self.paths.tool.clone(),
            jobs_base: self.paths.jobs_base.clone(),
            databases: self.paths.databases.clone(),
            timeout: self.worker.timeout(),
            inherit_output: self.worker.inherit_output,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    3000
}

/// Queue and status database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long to wait for another process's write lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("seqsearch.db")
}

fn default_busy_timeout() -> u64 {
    5000
}

/// File system locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory with the `*.params` catalog and the database files.
    #[serde(default = "default_databases")]
    pub databases: PathBuf,
    /// Directory receiving one subdirectory per ticket.
    #[serde(default = "default_jobs_base")]
    pub jobs_base: PathBuf,
    /// Pipeline executable.
    #[serde(default = "default_pipeline")]
    pub pipeline: PathBuf,
    /// Search tool binary handed to the pipeline.
    #[serde(default = "default_tool")]
    pub tool: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            databases: default_databases(),
            jobs_base: default_jobs_base(),
            pipeline: default_pipeline(),
            tool: default_tool(),
        }
    }
}

fn default_databases() -> PathBuf {
    PathBuf::from("databases")
}

fn default_jobs_base() -> PathBuf {
    PathBuf::from("jobs")
}

fn default_pipeline() -> PathBuf {
    PathBuf::from("run_job.sh")
}

fn default_tool() -> PathBuf {
    PathBuf::from("mmseqs")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub worker: WorkerConfig,
    pub mail: SanitizedMailConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMailConfig {
    pub transport: MailTransport,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailgun: Option<SanitizedMailgunConfig>,
    pub templates: NotificationTemplates,
}

/// Sanitized Mailgun config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMailgunConfig {
    pub domain: String,
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            paths: config.paths.clone(),
            worker: config.worker.clone(),
            mail: SanitizedMailConfig {
                transport: config.mail.transport,
                sender: config.mail.sender.clone(),
                mailgun: config.mail.mailgun.as_ref().map(|m| SanitizedMailgunConfig {
                    domain: m.domain.clone(),
                    base_url: m.base_url.clone(),
                    api_key_configured: !m.api_key.is_empty(),
                    timeout_secs: m.timeout_secs,
                }),
                templates: config.mail.templates.clone(),
            },
        }
    }
}
