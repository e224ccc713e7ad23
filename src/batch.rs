//! Batch runner behind the `teller run` command
//!
//! Feeds a list of queries through the router. A failure on one query is
//! recorded on its entry and the batch moves on.

use crate::context::BankContext;
use crate::routing::{Router, RunResult};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Demo queries run when no `--query` is given
pub const DEFAULT_QUERIES: [&str; 4] = [
    "What's my Balance? Account Number 1234567890123456",
    "Transfer $200. Account number is 9876543210987654",
    "Invalid query. Account number abc",
    "What's my balance? Account number 1234567890123456",
];

/// One processed query
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub query: String,
    /// The run, or the message of a fatal error raised while routing it
    pub outcome: Result<RunResult, String>,
    /// Balance of the context after this query
    pub balance_after: Decimal,
}

impl BatchEntry {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Query: {}", self.query);
        match &self.outcome {
            Ok(result) => {
                let _ = writeln!(out, "Response: {}", result.final_output);
            }
            Err(message) => {
                let _ = writeln!(out, "Error: {message}");
            }
        }
        let _ = write!(
            out,
            "Updated balance: {}",
            crate::context::format_money(self.balance_after)
        );
        out
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

#[derive(Clone)]
pub struct BatchRunner {
    router: Router,
    start_agent: String,
}

impl BatchRunner {
    pub fn new(router: Router, start_agent: impl Into<String>) -> Self {
        Self {
            router,
            start_agent: start_agent.into(),
        }
    }

    /// Route `queries` in order against one shared context
    pub async fn run_sequential<S: AsRef<str>>(
        &self,
        queries: &[S],
        context: &mut BankContext,
    ) -> Vec<BatchEntry> {
        let mut entries = Vec::with_capacity(queries.len());
        for (index, query) in queries.iter().enumerate() {
            let query = query.as_ref();
            info!(index, "Running batch query");
            let outcome = self
                .router
                .route(&self.start_agent, query, context)
                .await
                .map_err(|e| {
                    error!(index, "Batch query failed: {}", e);
                    e.user_message()
                });
            entries.push(BatchEntry {
                query: query.to_string(),
                outcome,
                balance_after: context.balance,
            });
        }
        entries
    }

    /// Route each query against its own copy of `opening`, concurrently.
    /// Entries come back in input order.
    pub async fn run_isolated<S: AsRef<str>>(
        &self,
        queries: &[S],
        opening: &BankContext,
    ) -> Vec<BatchEntry> {
        let mut tasks = JoinSet::new();
        for (index, query) in queries.iter().enumerate() {
            let query = query.as_ref().to_string();
            let router = self.router.clone();
            let start_agent = self.start_agent.clone();
            let mut context = opening.clone();
            tasks.spawn(async move {
                let outcome = router
                    .route(&start_agent, &query, &mut context)
                    .await
                    .map_err(|e| e.user_message());
                (
                    index,
                    BatchEntry {
                        query,
                        outcome,
                        balance_after: context.balance,
                    },
                )
            });
        }

        let mut slots: Vec<Option<BatchEntry>> = vec![None; queries.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry)) => slots[index] = Some(entry),
                Err(e) => error!("Batch task did not complete: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(queries)
            .map(|(slot, query)| {
                slot.unwrap_or_else(|| BatchEntry {
                    query: query.as_ref().to_string(),
                    outcome: Err("query task aborted".to_string()),
                    balance_after: opening.balance,
                })
            })
            .collect()
    }
}
