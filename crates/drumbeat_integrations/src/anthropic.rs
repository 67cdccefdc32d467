//! Anthropic Messages API driver for the completion seam.

use async_trait::async_trait;
use drumbeat_core::{CompletionRequest, CompletionResponse, Role};
use drumbeat_error::{CompletionError, ConfigError, DrumbeatResult};
use drumbeat_interface::CompletionDriver;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireContentBlock>,
}

/// Anthropic API client.
#[derive(Debug, Clone)]
pub struct AnthropicDriver {
    http: Client,
    api_key: String,
    model: String,
}

impl AnthropicDriver {
    /// Create a driver for the given key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Create a driver from `ANTHROPIC_API_KEY`, with the default model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the variable is unset.
    pub fn from_env() -> DrumbeatResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::new("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, DEFAULT_MODEL))
    }

    fn convert(&self, req: &CompletionRequest) -> DrumbeatResult<WireRequest> {
        let mut system: Option<String> = None;
        let mut messages = Vec::with_capacity(req.messages.len());
        for message in &req.messages {
            match message.role {
                // The Messages API takes system text as a top-level field.
                Role::System => match &mut system {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(&message.content);
                    }
                    None => system = Some(message.content.clone()),
                },
                Role::User => messages.push(WireMessage {
                    role: "user",
                    content: message.content.clone(),
                }),
                Role::Assistant => messages.push(WireMessage {
                    role: "assistant",
                    content: message.content.clone(),
                }),
            }
        }
        if messages.is_empty() {
            return Err(
                CompletionError::new("completion request has no user messages").into(),
            );
        }
        Ok(WireRequest {
            model: req.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: req.temperature,
            messages,
        })
    }
}

#[async_trait]
impl CompletionDriver for AnthropicDriver {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn complete(&self, req: &CompletionRequest) -> DrumbeatResult<CompletionResponse> {
        let wire = self.convert(req)?;
        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&wire)
            .send()
            .await
            .map_err(|e| CompletionError::new(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Anthropic API returned an error");
            return Err(CompletionError::new(format!(
                "Anthropic API error {status}: {body}"
            ))
            .into());
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::new(format!("failed to parse response: {e}")))?;
        let text = wire
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        debug!(text_len = text.len(), "Completion received");
        Ok(CompletionResponse { text })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
