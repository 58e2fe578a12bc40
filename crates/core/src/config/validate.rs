use super::{types::Config, ConfigError};
use crate::notify::MailTransport;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker timeout, poll interval and concurrency are non-zero
/// - Databases directory, jobs directory and pipeline exist
/// - Mailgun settings are present when that transport is selected
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.worker.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "worker.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.worker.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "worker.poll_interval_ms must be greater than 0".to_string(),
        ));
    }

    if config.worker.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "worker.concurrency must be at least 1".to_string(),
        ));
    }

    for (key, path) in [
        ("paths.databases", &config.paths.databases),
        ("paths.jobs_base", &config.paths.jobs_base),
        ("paths.pipeline", &config.paths.pipeline),
    ] {
        if !path.exists() {
            return Err(ConfigError::ValidationError(format!(
                "{} does not exist: {}",
                key,
                path.display()
            )));
        }
    }

    if config.mail.transport == MailTransport::Mailgun {
        match &config.mail.mailgun {
            Some(m) if !m.domain.is_empty() && !m.api_key.is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "mail.mailgun.domain and mail.mailgun.api_key are required for the mailgun transport"
                        .to_string(),
                ));
            }
        }
    }

    Ok(())
}
