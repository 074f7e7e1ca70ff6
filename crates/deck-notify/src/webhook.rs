use std::time::Duration;

use async_trait::async_trait;
use deck_core::{Notifier, NotifyError};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipients: &'a [String],
    subject: &'a str,
    body: &'a str,
}

/// Posts notifications as JSON to an HTTP endpoint (mail relay, chat hook)
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .user_agent("deck/0.1 (notifier)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                recipients,
                subject,
                body,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "HTTP error {}: {}",
                response.status().as_u16(),
                self.url
            )));
        }

        info!("Notified {} recipients via {}", recipients.len(), self.url);
        Ok(())
    }
}
