use async_trait::async_trait;
use thiserror::Error;

use super::types::Mail;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("Mail rejected by transport: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one mail. A single attempt; callers do not retry.
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError>;

    /// Name of this transport
    fn transport_name(&self) -> &'static str;
}
