use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use cs_core::errors::DomainError;
use cs_core::services::{Notification, Notifier};
use cs_shared::EmailConfig;

use crate::InfrastructureError;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

/// Sends notifications through the Resend HTTP API
pub struct ResendNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, InfrastructureError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| InfrastructureError::Config("RESEND_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_base_url.trim_end_matches('/')),
            api_key,
            from: config.from.clone(),
        })
    }

    fn request<'a>(&'a self, notification: &'a Notification) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.from,
            to: [notification.recipient()],
            subject: notification.subject(),
            text: notification.body(),
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), InfrastructureError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(notification))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(kind = notification.kind(), "Resend accepted email");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Resend rejected email");
        Err(InfrastructureError::Email(format!("status {}: {}", status, body)))
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        self.deliver(notification).await.map_err(DomainError::from)
    }
}
