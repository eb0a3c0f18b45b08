use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{Config, PayloadMode};
use crate::error::TransportError;
use crate::message::{Message, Role};

/// Request/response exchange with the chat endpoint.
///
/// Implementations must not touch the transcript; they only turn a history
/// snapshot into a reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_turn(&self, messages: &[Message]) -> Result<String, TransportError>;
}

#[derive(Serialize)]
struct HistoryRequest<'a> {
    messages: &'a [Message],
}

#[derive(Serialize)]
struct SingleRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    mode: PayloadMode,
}

impl HttpTransport {
    pub fn new(
        endpoint: &str,
        mode: PayloadMode,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
            mode,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.endpoint()?;
        Ok(Self::new(endpoint, config.mode, config.timeout())?)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn mode(&self) -> PayloadMode {
        self.mode
    }

    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.text().await?;
        let reply: ChatReply = serde_json::from_str(&body)
            .map_err(|source| TransportError::Decode { source, body })?;
        Ok(reply.reply)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_turn(&self, messages: &[Message]) -> Result<String, TransportError> {
        log::debug!(
            "[transport] POST {} ({} mode, {} messages)",
            self.endpoint,
            self.mode.as_str(),
            messages.len()
        );

        match self.mode {
            PayloadMode::History => self.post(&HistoryRequest { messages }).await,
            PayloadMode::Single => {
                let latest = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .ok_or(TransportError::NoUserMessage)?;
                self.post(&SingleRequest {
                    message: &latest.content,
                })
                .await
            }
        }
    }
}
