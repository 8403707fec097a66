//! Webhook-style HTTP transport. POSTs the personalized payload as JSON to
//! a single provider endpoint with bearer auth.
//!
//! The request timeout lives here, on the client: a hung provider surfaces
//! as a per-recipient transport error, never as a stuck batch.

use crate::domain::{DomainError, MessageTemplate, OutboundMessage, ProviderReceipt};
use crate::ports::MessageTransport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpTransport {
    /// # Arguments
    /// * `api_url` - provider send endpoint
    /// * `api_key` - bearer token (may be empty for unauthenticated gateways)
    /// * `timeout` - per-request timeout
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Transport(format!("build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

/// Provider send request.
#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a MessageTemplate>,
}

/// Provider acknowledgement.
#[derive(Deserialize)]
struct SendResponse {
    message_id: String,
}

#[async_trait::async_trait]
impl MessageTransport for HttpTransport {
    async fn send(
        &self,
        address: &str,
        message: &OutboundMessage,
    ) -> Result<ProviderReceipt, DomainError> {
        let request = SendRequest {
            to: address,
            body: message.body_text(),
            template: match message {
                OutboundMessage::Template(t) => Some(t),
                OutboundMessage::Text { .. } => None,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "provider returned error");
            return Err(DomainError::Transport(format!(
                "provider error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let ack: SendResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Transport(format!("parse provider response: {e}")))?;

        debug!(address, message_id = %ack.message_id, "message accepted by provider");
        Ok(ProviderReceipt {
            provider_message_id: ack.message_id,
        })
    }
}
