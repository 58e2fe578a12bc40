//! Mailgun HTTP API transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Mail, MailgunConfig, Notifier, NotifyError};

/// Sends mail through Mailgun's `messages` endpoint.
pub struct MailgunNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl MailgunNotifier {
    pub fn new(config: &MailgunConfig) -> Result<Self, NotifyError> {
        if config.domain.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(NotifyError::ConfigurationError(
                "mailgun domain and api_key must be set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: messages_endpoint(&config.base_url, &config.domain),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn messages_endpoint(base_url: &str, domain: &str) -> String {
    format!("{}/v3/{}/messages", base_url.trim_end_matches('/'), domain)
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        let form = [
            ("from", mail.sender.as_str()),
            ("to", mail.recipient.as_str()),
            ("subject", mail.subject.as_str()),
            ("text", mail.body.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!(to = %mail.recipient, "Mail accepted by Mailgun");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mailgun"
    }
}
