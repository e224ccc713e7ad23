//! Completion capability consumed by agents
//!
//! One call is one request/response: instructions, the user's query and the
//! serialised account state go out; text or a failure comes back. A failure
//! after the request was sent leaves the remote effect unknown, so callers
//! must not touch the context before a successful reply.

use crate::llm::provider::{CompletionRequest, LlmError, LlmProvider, Message};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Everything the remote model sees for one agent turn
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    pub model: String,
    pub instructions: String,
    pub query: String,
    /// Auxiliary state, usually `BankContext::snapshot` plus turn notes
    pub context: Value,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError>;
}

/// `CompletionClient` backed by an [`LlmProvider`]
pub struct ProviderCompletionClient {
    provider: Arc<dyn LlmProvider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ProviderCompletionClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Check the provider is reachable and accepts the configured credentials
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.provider.health_check().await
    }

    /// Render the system and user messages for a call (pure function)
    pub fn build_request(&self, call: &CompletionCall) -> CompletionRequest {
        let state = serde_json::to_string_pretty(&call.context)
            .unwrap_or_else(|_| call.context.to_string());
        let system = format!("{}\n\nAccount state:\n{}", call.instructions, state);

        CompletionRequest {
            messages: vec![Message::system(system), Message::user(call.query.clone())],
            model: call.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl CompletionClient for ProviderCompletionClient {
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError> {
        let request = self.build_request(&call);
        let response = self.provider.complete(request).await?;

        match response.content {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(LlmError::InvalidResponse(format!(
                "{} returned no text (finish reason {:?})",
                self.provider.name(),
                response.finish_reason
            ))),
        }
    }
}
