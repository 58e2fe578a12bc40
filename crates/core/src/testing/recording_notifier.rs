//! Notifier that records mails instead of sending them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::notify::{Mail, Notifier, NotifyError};

/// Records every delivered mail for test assertions.
///
/// ```rust,ignore
/// use seqsearch_core::testing::RecordingNotifier;
///
/// let notifier = Arc::new(RecordingNotifier::new());
/// // ... run a worker tick ...
/// assert_eq!(notifier.sent()[0].subject, "Done -- abc");
/// ```
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Mail>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Successfully delivered mails, oldest first.
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Delivery attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("simulated failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}
