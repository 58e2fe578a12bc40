use serde::{Deserialize, Serialize};

/// Placeholder replaced with the ticket in every template.
pub const TICKET_PLACEHOLDER: &str = "{ticket}";

/// A single outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Which template a job outcome selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Launch failure or abnormal exit.
    Error,
    Timeout,
    Success,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Error => "error",
            NotificationKind::Timeout => "timeout",
            NotificationKind::Success => "success",
        }
    }
}

/// Subject/body pairs per outcome kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplates {
    #[serde(default = "default_error_subject")]
    pub error_subject: String,
    #[serde(default = "default_body")]
    pub error_body: String,
    #[serde(default = "default_timeout_subject")]
    pub timeout_subject: String,
    #[serde(default = "default_body")]
    pub timeout_body: String,
    #[serde(default = "default_success_subject")]
    pub success_subject: String,
    #[serde(default = "default_body")]
    pub success_body: String,
}

fn default_error_subject() -> String {
    "Error -- {ticket}".to_string()
}

fn default_timeout_subject() -> String {
    "Timeout -- {ticket}".to_string()
}

fn default_success_subject() -> String {
    "Done -- {ticket}".to_string()
}

fn default_body() -> String {
    TICKET_PLACEHOLDER.to_string()
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self {
            error_subject: default_error_subject(),
            error_body: default_body(),
            timeout_subject: default_timeout_subject(),
            timeout_body: default_body(),
            success_subject: default_success_subject(),
            success_body: default_body(),
        }
    }
}

impl NotificationTemplates {
    /// Render (subject, body) for `kind`, substituting every placeholder.
    pub fn render(&self, kind: NotificationKind, ticket: &str) -> (String, String) {
        let (subject, body) = match kind {
            NotificationKind::Error => (&self.error_subject, &self.error_body),
            NotificationKind::Timeout => (&self.timeout_subject, &self.timeout_body),
            NotificationKind::Success => (&self.success_subject, &self.success_body),
        };
        (
            subject.replace(TICKET_PLACEHOLDER, ticket),
            body.replace(TICKET_PLACEHOLDER, ticket),
        )
    }
}

/// Mail delivery backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTransport {
    /// Log and drop.
    #[default]
    Null,
    Mailgun,
}

/// Mailgun HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailgunConfig {
    pub domain: String,
    pub api_key: String,
    #[serde(default = "default_mailgun_base_url")]
    pub base_url: String,
    #[serde(default = "default_mailgun_timeout")]
    pub timeout_secs: u64,
}

fn default_mailgun_base_url() -> String {
    "https://api.mailgun.net".to_string()
}

fn default_mailgun_timeout() -> u64 {
    30
}

/// Notification configuration (`[mail]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: MailTransport,
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default)]
    pub mailgun: Option<MailgunConfig>,
    #[serde(default)]
    pub templates: NotificationTemplates,
}

fn default_sender() -> String {
    "seqsearch@localhost".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            sender: default_sender(),
            mailgun: None,
            templates: NotificationTemplates::default(),
        }
    }
}
