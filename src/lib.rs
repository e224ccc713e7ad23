//! Teller - guardrail-gated multi-agent bank assistant
//!
//! A triage agent routes free-text banking queries to a balance agent or a
//! transaction agent. An account-number guardrail gates what goes in and a
//! politeness guardrail gates what comes out; replies come from a remote model
//! reached over an OpenAI-compatible chat-completions API.
//!
//! # Overview
//!
//! - [`guardrails`]: pure input/output checks and the engine that resolves them by name
//! - [`agents`]: agent definitions, the registry and per-role turn planning
//! - [`routing`]: the handoff classifier and the routing state machine
//! - [`llm`]: the completion capability and its HTTP provider
//! - [`batch`]: sequential and isolated batch runs
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use teller::config::TellerConfig;
//! use teller::context::BankContext;
//! use teller::routing::Router;
//! use teller::testing::MockCompletionClient;
//!
//! # tokio_test_block();
//! # fn tokio_test_block() {
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let client = MockCompletionClient::echo_balance();
//!     let router = Router::from_config(&TellerConfig::default(), Arc::new(client)).unwrap();
//!
//!     let mut context = BankContext::default();
//!     let result = router
//!         .route("TriageAgent", "What's my balance? Account number 1234567890123456", &mut context)
//!         .await
//!         .unwrap();
//!
//!     assert!(result.is_accepted());
//!     assert!(result.final_output.contains("$1000.00"));
//! });
//! # }
//! ```

pub mod agents;
pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod guardrails;
pub mod llm;
pub mod observability;
pub mod routing;
pub mod testing;

pub use config::{ConfigError, TellerConfig};
pub use context::BankContext;
pub use error::{TellerError, TellerResult};
pub use routing::{Router, RunOutcome, RunResult};
