//! Outcome notification dispatch.

use std::sync::Arc;

use tracing::{error, info};

use super::{Mail, NotificationKind, NotificationTemplates, Notifier};
use crate::metrics;

/// Result of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Sent,
    /// The job has no notification address.
    Skipped,
    /// Delivery failed; already logged.
    Failed,
}

impl DispatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchResult::Sent => "sent",
            DispatchResult::Skipped => "skipped",
            DispatchResult::Failed => "failed",
        }
    }
}

/// Renders outcome templates and hands them to a [`Notifier`].
///
/// Failures are logged and counted, never retried and never propagated: a
/// broken mail setup must not stop the worker.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    templates: NotificationTemplates,
    sender: String,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        templates: NotificationTemplates,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            templates,
            sender: sender.into(),
        }
    }

    pub async fn dispatch(
        &self,
        kind: NotificationKind,
        ticket: &str,
        recipient: Option<&str>,
    ) -> DispatchResult {
        let Some(recipient) = recipient else {
            return self.record(DispatchResult::Skipped);
        };

        let (subject, body) = self.templates.render(kind, ticket);
        let mail = Mail {
            sender: self.sender.clone(),
            recipient: recipient.to_string(),
            subject,
            body,
        };

        match self.notifier.send(&mail).await {
            Ok(()) => {
                info!(
                    ticket = %ticket,
                    kind = kind.as_str(),
                    transport = self.notifier.transport_name(),
                    "Notification sent"
                );
                self.record(DispatchResult::Sent)
            }
            Err(e) => {
                error!(
                    ticket = %ticket,
                    kind = kind.as_str(),
                    transport = self.notifier.transport_name(),
                    error = %e,
                    "Failed to deliver notification"
                );
                self.record(DispatchResult::Failed)
            }
        }
    }

    fn record(&self, result: DispatchResult) -> DispatchResult {
        metrics::NOTIFICATIONS_TOTAL
            .with_label_values(&[result.as_str()])
            .inc();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingNotifier;

    fn dispatcher(notifier: Arc<RecordingNotifier>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            notifier,
            NotificationTemplates::default(),
            "noreply@example.org",
        )
    }

    #[tokio::test]
    async fn test_dispatch_renders_template() {
        let notifier = Arc::new(RecordingNotifier::new());
        let result = dispatcher(notifier.clone())
            .dispatch(NotificationKind::Timeout, "t1", Some("user@example.org"))
            .await;

        assert_eq!(result, DispatchResult::Sent);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Timeout -- t1");
        assert_eq!(sent[0].body, "t1");
        assert_eq!(sent[0].sender, "noreply@example.org");
        assert_eq!(sent[0].recipient, "user@example.org");
    }

    #[tokio::test]
    async fn test_dispatch_without_recipient_is_skipped() {
        let notifier = Arc::new(RecordingNotifier::new());
        let result = dispatcher(notifier.clone())
            .dispatch(NotificationKind::Success, "t1", None)
            .await;

        assert_eq!(result, DispatchResult::Skipped);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let result = dispatcher(notifier.clone())
            .dispatch(NotificationKind::Error, "t1", Some("user@example.org"))
            .await;

        assert_eq!(result, DispatchResult::Failed);
        assert_eq!(notifier.attempts(), 1);
    }
}
