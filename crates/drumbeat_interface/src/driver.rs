//! Trait definition for the language-model completion service.

use async_trait::async_trait;
use drumbeat_core::{CompletionRequest, CompletionResponse};
use drumbeat_error::DrumbeatResult;

/// Text-completion service consumed by the pipelines.
///
/// This is the minimal interface the pipelines need: one prompt in, one
/// text completion out. Provider selection, rate limiting, and retries are
/// the implementation's concern.
#[async_trait]
pub trait CompletionDriver: Send + Sync {
    /// Generate a completion for the given request.
    async fn complete(&self, req: &CompletionRequest) -> DrumbeatResult<CompletionResponse>;

    /// Provider name (e.g. "anthropic", "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}
