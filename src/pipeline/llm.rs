//! Remote text generation: send one prompt, get one completion.
//!
//! The orchestrator talks to a [`Generator`], not to a provider directly.
//! [`LlmGenerator`] is the production implementation over any
//! `edgequake-llm` provider; tests substitute scripted generators.
//!
//! There is no retry here. A failed call is reported once and the caller
//! decides what to do with it.

use crate::config::AnalysisConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// One "generate text from prompt" request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Model identifier, e.g. `"gpt-4o-mini"`.
    pub model: String,
    /// System-role instruction framing the assistant.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output tokens.
    pub max_tokens: usize,
}

impl GenerationRequest {
    /// Build a request from the config with the batch output limit.
    pub fn batch(config: &AnalysisConfig, prompt: String) -> Self {
        Self::with_limit(config, prompt, config.max_tokens)
    }

    /// Build a request from the config with the single-call output limit.
    pub fn single(config: &AnalysisConfig, prompt: String) -> Self {
        Self::with_limit(config, prompt, config.single_call_max_tokens)
    }

    fn with_limit(config: &AnalysisConfig, prompt: String, max_tokens: usize) -> Self {
        Self {
            model: config.model_or_default().to_string(),
            system: config.system_prompt_or_default().to_string(),
            prompt,
            temperature: config.temperature,
            max_tokens,
        }
    }
}

/// A single completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Generation {
    /// A completion with no token accounting.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Anything that can answer a [`GenerationRequest`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        (**self).generate(request).await
    }
}

/// [`Generator`] over an `edgequake-llm` chat provider.
///
/// The provider is bound to its model at construction, so
/// [`GenerationRequest::model`] is informational here.
#[derive(Clone)]
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.prompt.as_str()),
        ];
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                let err = GenerationError::from_provider_message(format!("{}", e));
                warn!("Generation call failed — {}", err);
                err
            })?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(GenerationError::MalformedResponse {
                detail: "completion contained no text".into(),
            });
        }

        Ok(Generation {
            content: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }
}

/// Build `CompletionOptions` from a request.
fn build_options(request: &GenerationRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = AnalysisConfig::default();
        let request = GenerationRequest::batch(&config, "prompt".into());
        let opts = build_options(&request);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(1200));
    }

    #[test]
    fn single_request_uses_larger_limit() {
        let config = AnalysisConfig::default();
        let request = GenerationRequest::single(&config, "prompt".into());
        assert_eq!(request.max_tokens, 1500);
        assert_eq!(request.model, "gpt-4o-mini");
        assert!(request.system.starts_with("You are an AI chatbot"));
    }
}
