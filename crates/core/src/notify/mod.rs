//! Outcome notifications (mail).

mod dispatcher;
mod mailgun;
mod null;
mod traits;
mod types;

pub use dispatcher::*;
pub use mailgun::*;
pub use null::*;
pub use traits::*;
pub use types::*;

/// Factory function to create a mail transport from config
pub fn create_notifier(config: &MailConfig) -> Result<Box<dyn Notifier>, NotifyError> {
    match config.transport {
        MailTransport::Null => Ok(Box::new(NullNotifier::new())),
        MailTransport::Mailgun => {
            let mailgun = config.mailgun.as_ref().ok_or_else(|| {
                NotifyError::ConfigurationError(
                    "[mail.mailgun] must be set when using the mailgun transport".to_string(),
                )
            })?;
            Ok(Box::new(MailgunNotifier::new(mailgun)?))
        }
    }
}
