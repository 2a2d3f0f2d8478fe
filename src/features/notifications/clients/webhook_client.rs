use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::WebhookConfig;
use crate::features::notifications::models::AlertPayload;

/// A single failed delivery attempt
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Webhook request timed out")]
    Timeout,

    #[error("Webhook request failed: {0}")]
    Transport(String),

    #[error("Webhook returned unexpected status: {0}")]
    UnexpectedStatus(u16),
}

/// One delivery attempt of an alert to the external receiver
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, payload: &AlertPayload) -> Result<(), DeliveryError>;
}

/// Posts alerts as JSON to the configured webhook URL
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .user_agent("GeofenceAlertCore/1.0 (webhook-dispatcher)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WebhookSender for WebhookClient {
    async fn send(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        // `.json()` sets Content-Type: application/json
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::UnexpectedStatus(status.as_u16()));
        }

        Ok(())
    }
}
