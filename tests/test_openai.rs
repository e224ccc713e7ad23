//! Integration tests for the OpenAI-compatible provider
//!
//! Tests behavioral contracts against a local mock server:
//! - request shape and bearer authentication
//! - error classification (auth, rate limits, server errors, timeouts)
//! - bounded retries
//! - the completion client and router on top of a real HTTP provider

use std::sync::Arc;
use std::time::Duration;
use teller::agents::bank::TRIAGE_AGENT;
use teller::config::TellerConfig;
use teller::context::BankContext;
use teller::llm::provider::{CompletionRequest, FinishReason, LlmError, LlmProvider, Message};
use teller::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use teller::llm::{CompletionCall, CompletionClient, ProviderCompletionClient};
use teller::routing::{Router, RunOutcome};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
    }
}

fn test_request(model: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            Message::system("You provide account balance information."),
            Message::user("What's my balance?"),
        ],
        model: model.to_string(),
        max_tokens: Some(100),
        temperature: Some(0.2),
    }
}

fn chat_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gemini-2.5-flash",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ],
        "usage": { "prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52 }
    })
}

#[tokio::test]
async fn test_provider_returns_completion_for_valid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gemini-2.5-flash",
            "messages": [{ "role": "system" }, { "role": "user", "content": "What's my balance?" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Your balance is $1000.00.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider
        .complete(test_request("gemini-2.5-flash"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("Your balance is $1000.00."));
    assert_eq!(response.model, "gemini-2.5-flash");
    assert_eq!(response.usage.total_tokens, 52);
    assert_eq!(response.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn test_provider_tolerates_missing_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi" }, "finish_reason": "length" }]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("m")).await.unwrap();

    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn test_provider_maps_unauthorized_to_authentication_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_provider_maps_429_to_rate_limit_without_retrying() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.max_retries = 3;
    let provider = OpenAiProvider::new(config).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_provider_sends_once_by_default_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::ApiError(_))));
}

#[tokio::test]
async fn test_provider_retries_server_errors_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Recovered")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.max_retries = 2;
    let provider = OpenAiProvider::new(config).unwrap();
    let response = provider.complete(test_request("m")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Recovered"));
}

#[tokio::test]
async fn test_provider_times_out_slow_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.timeout = Duration::from_millis(200);
    let provider = OpenAiProvider::new(config).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::Timeout(_))));
}

#[tokio::test]
async fn test_health_check_lists_models() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_ok());
}

#[tokio::test]
async fn test_completion_client_sends_account_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  All set.  ")))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let client = ProviderCompletionClient::new(Arc::new(provider));
    let text = client
        .complete(CompletionCall {
            model: "m".to_string(),
            instructions: "Be brief.".to_string(),
            query: "Balance?".to_string(),
            context: serde_json::json!({ "balance": "$1000.00" }),
        })
        .await
        .unwrap();
    assert_eq!(text, "All set.");

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with("Be brief."));
    assert!(system.contains("$1000.00"));
}

#[tokio::test]
async fn test_router_reports_upstream_failure_without_mutation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let client = ProviderCompletionClient::new(Arc::new(provider));
    let router = Router::from_config(&TellerConfig::default(), Arc::new(client)).unwrap();

    let mut context = BankContext::default();
    let result = router
        .route(
            TRIAGE_AGENT,
            "Transfer $200. Account number is 9876543210987654",
            &mut context,
        )
        .await
        .unwrap();

    assert!(matches!(result.outcome, RunOutcome::Failed { ref kind, .. } if kind == "api"));
    assert_eq!(context, BankContext::default());
}
