//! Batch runner behaviour over the demo queries

use rust_decimal_macros::dec;
use std::sync::Arc;
use teller::batch::{BatchRunner, DEFAULT_QUERIES};
use teller::config::TellerConfig;
use teller::context::BankContext;
use teller::llm::LlmError;
use teller::routing::Router;
use teller::testing::MockCompletionClient;

fn runner(client: MockCompletionClient) -> BatchRunner {
    let router = Router::from_config(&TellerConfig::default(), Arc::new(client)).unwrap();
    BatchRunner::new(router, "TriageAgent")
}

#[tokio::test]
async fn test_demo_batch_output() {
    let mut context = BankContext::default();
    let entries = runner(MockCompletionClient::echo_balance())
        .run_sequential(&DEFAULT_QUERIES, &mut context)
        .await;

    let rendered: Vec<String> = entries.iter().map(|e| e.render()).collect();
    assert!(rendered[0].contains("Response: Your current balance is $1000.00"));
    assert!(rendered[1].ends_with("Updated balance: $800.00"));
    assert!(rendered[2].contains("Invalid or missing account number"));
    assert!(rendered[3].contains("Response: Your current balance is $800.00"));
    assert_eq!(context.balance, dec!(800));
}

#[tokio::test]
async fn test_upstream_failures_do_not_stop_the_batch() {
    let mut context = BankContext::default();
    let entries = runner(MockCompletionClient::failing(LlmError::NetworkError(
        "connection refused".to_string(),
    )))
    .run_sequential(&DEFAULT_QUERIES, &mut context)
    .await;

    assert_eq!(entries.len(), DEFAULT_QUERIES.len());
    assert!(entries[0].outcome.as_ref().unwrap().is_failed());
    assert!(entries[1].outcome.as_ref().unwrap().is_failed());
    assert!(entries[2].outcome.as_ref().unwrap().is_rejected());
    assert_eq!(context.balance, dec!(1000));
}

#[tokio::test]
async fn test_isolated_batch_uses_fresh_accounts() {
    let queries: Vec<String> = (0..6)
        .map(|_| "Transfer $100. Account number 9876543210987654".to_string())
        .collect();
    let opening = BankContext::new(dec!(250));
    let entries = runner(MockCompletionClient::scripted(vec!["Transfer confirmed."]))
        .run_isolated(&queries, &opening)
        .await;

    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.balance_after == dec!(150)));
}
