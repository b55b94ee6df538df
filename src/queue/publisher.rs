use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{PublishError, QueueMessage};
use crate::config::BrokerConfig;
use crate::error::Result;

/// Hands validated messages to a named queue.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: &QueueMessage) -> std::result::Result<(), PublishError>;
}

/// Per-call overrides for [`RabbitPublisher::publish_with`].
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub exchange: Option<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    properties: &'a serde_json::Map<String, serde_json::Value>,
    routing_key: &'a str,
    payload: String,
    payload_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    routed: bool,
}

/// Publishes through the RabbitMQ management HTTP API.
pub struct RabbitPublisher {
    client: Client,
    config: BrokerConfig,
}

impl RabbitPublisher {
    pub fn new(config: BrokerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn publish_url(&self, exchange: &str) -> String {
        format!(
            "{}/api/exchanges/{}/{}/publish",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.vhost),
            urlencoding::encode(exchange)
        )
    }

    pub async fn publish_with(
        &self,
        message: &QueueMessage,
        options: &PublishOptions,
    ) -> std::result::Result<(), PublishError> {
        message.validate()?;

        let queue = message.queue();
        let body = message.to_json()?;

        if self.config.dry_run {
            tracing::warn!(
                "Dry run: skipping publish to queue '{}': {}",
                queue,
                String::from_utf8_lossy(&body)
            );
            return Ok(());
        }

        let exchange = options
            .exchange
            .as_deref()
            .unwrap_or(&self.config.exchange);
        let request = PublishRequest {
            properties: &options.properties,
            routing_key: queue.as_str(),
            payload: STANDARD.encode(&body),
            payload_encoding: "base64",
        };

        let response = self
            .client
            .post(self.publish_url(exchange))
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PublishError::Transport(format!(
                    "could not reach broker at {}: {}",
                    self.config.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PublishError::Transport(format!(
                "failed to publish to queue \"{}\": {} - {}",
                queue, status, error_text
            )));
        }

        let result: PublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Transport(format!("unexpected broker response: {}", e)))?;

        if !result.routed {
            return Err(PublishError::Routing(format!(
                "message to queue \"{}\" was not routed; check that the queue exists and is bound to exchange \"{}\"",
                queue, exchange
            )));
        }

        tracing::debug!("Published message to queue '{}'", queue);
        Ok(())
    }
}

#[async_trait]
impl Publisher for RabbitPublisher {
    async fn publish(&self, message: &QueueMessage) -> std::result::Result<(), PublishError> {
        self.publish_with(message, &PublishOptions::default()).await
    }
}
