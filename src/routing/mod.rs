//! Query routing
//!
//! The [`HandoffClassifier`] decides whether the current agent keeps the turn
//! or hands it to a specialist; the [`Router`] drives a query through input
//! guardrails, handoffs, the completion call and output guardrails.

pub mod classifier;
pub mod router;

pub use classifier::{HandoffClassifier, HandoffDecision};
pub use router::{Router, RouterSettings, RunOutcome, RunResult, RunStage};
