//! Request and response types for the text-completion service.

use serde::{Deserialize, Serialize};

/// Message sender role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The requesting pipeline
    User,
    /// The model
    Assistant,
}

/// One message in a completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Text-completion request.
///
/// # Examples
///
/// ```
/// use drumbeat_core::{ChatMessage, CompletionRequest};
///
/// let request = CompletionRequest::builder()
///     .messages(vec![ChatMessage::user("Draft an outline.")])
///     .max_tokens(Some(800))
///     .temperature(Some(0.7))
///     .model(None)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder)]
#[builder(default)]
pub struct CompletionRequest {
    /// The conversation messages to send
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier to use
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Start a builder.
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Convenience constructor for the common system + user prompt pair.
    pub fn from_prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: None,
            temperature: None,
            model: None,
        }
    }
}

/// Text-completion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,
}
