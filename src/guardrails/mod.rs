//! Input and output guardrails
//!
//! A guardrail is a deterministic pass/fail check on text entering or leaving
//! an agent. Guardrails never error on malformed payloads; malformed input is
//! simply a reason to trip the wire.
//!
//! The built-in checks are literal string heuristics (substring search and
//! digit counting). They say nothing about the semantic quality of a query or
//! a reply.

pub mod account;
pub mod engine;
pub mod politeness;

pub use account::{AccountCheck, AccountNumberGuardrail, ACCOUNT_GUARDRAIL};
pub use engine::GuardrailEngine;
pub use politeness::{PolitenessCheck, PolitenessGuardrail, POLITENESS_GUARDRAIL};

use crate::context::BankContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name under which a guardrail is registered with the engine
pub type GuardrailRef = String;

/// Which side of an agent a guardrail protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailKind {
    Input,
    Output,
}

impl std::fmt::Display for GuardrailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardrailKind::Input => write!(f, "input"),
            GuardrailKind::Output => write!(f, "output"),
        }
    }
}

/// Verdict of a single guardrail evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub guardrail: String,
    pub kind: GuardrailKind,
    /// Guardrail-specific structured verdict (see `AccountCheck`, `PolitenessCheck`)
    pub output_info: Value,
    pub tripwire_triggered: bool,
}

impl GuardrailResult {
    /// Human-readable reason recorded by the guardrail, if any
    pub fn reason(&self) -> Option<&str> {
        self.output_info.get("reason").and_then(Value::as_str)
    }
}

/// A named check applied to agent input or output
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> GuardrailKind;

    /// Evaluate `payload`. Must be a pure function of its arguments.
    fn check(&self, context: &BankContext, payload: &str) -> GuardrailResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reason_reads_output_info() {
        let result = GuardrailResult {
            guardrail: "account_number".to_string(),
            kind: GuardrailKind::Input,
            output_info: json!({"is_valid": false, "reason": "Invalid or missing account number"}),
            tripwire_triggered: true,
        };
        assert_eq!(result.reason(), Some("Invalid or missing account number"));
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&GuardrailKind::Output).unwrap(),
            "\"output\""
        );
        assert_eq!(GuardrailKind::Input.to_string(), "input");
    }
}
