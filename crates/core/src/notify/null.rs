use async_trait::async_trait;
use tracing::debug;

use super::{Mail, Notifier, NotifyError};

/// Transport that logs each mail and drops it.
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        debug!(
            to = %mail.recipient,
            subject = %mail.subject,
            "Dropping mail (null transport)"
        );
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "null"
    }
}
