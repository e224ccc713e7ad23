//! Mock implementations for testing
//!
//! Provides mock `LlmProvider` and `CompletionClient` implementations that
//! record what they were asked and answer from a script.

use crate::llm::client::{CompletionCall, CompletionClient};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Mock LLM provider for testing
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    pub should_fail: bool,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    pub async fn get_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

type Responder = dyn Fn(&CompletionCall) -> Result<String, LlmError> + Send + Sync;

/// Scriptable completion client that records every call it receives
#[derive(Clone)]
pub struct MockCompletionClient {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<CompletionCall>>>,
}

impl MockCompletionClient {
    /// Answer every call with `responder`
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionCall) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Cycle through `responses`, one per call
    pub fn scripted<S: Into<String>>(responses: Vec<S>) -> Self {
        let responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        let cursor = std::sync::atomic::AtomicUsize::new(0);
        Self::from_fn(move |_| {
            if responses.is_empty() {
                return Ok("Mock response".to_string());
            }
            let idx = cursor.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(responses[idx % responses.len()].clone())
        })
    }

    /// Polite reply quoting the balance from the call's account state
    pub fn echo_balance() -> Self {
        Self::from_fn(|call| {
            let balance = call.context["balance"].as_str().unwrap_or("unknown");
            Ok(format!("Your current balance is {balance}. Have a great day!"))
        })
    }

    /// Fail every call with `error`
    pub fn failing(error: LlmError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle on the recorded calls
    pub fn calls(&self) -> Arc<Mutex<Vec<CompletionCall>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError> {
        self.calls.lock().await.push(call.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&call)
    }
}
