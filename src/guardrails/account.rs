//! Account-number input guardrail
//!
//! Finds the last case-insensitive occurrence of the marker phrase and takes
//! the final whitespace-separated token after it. The token is a valid account
//! number iff it is made only of ASCII digits and has exactly the configured
//! length. Leading zeros are allowed.

use super::{Guardrail, GuardrailKind, GuardrailResult};
use crate::context::BankContext;
use serde::{Deserialize, Serialize};

pub const ACCOUNT_GUARDRAIL: &str = "account_number";

/// Structured verdict stored in `GuardrailResult::output_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCheck {
    pub is_valid: bool,
    pub reason: String,
    /// Candidate token after the marker, present even when invalid
    pub account_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountNumberGuardrail {
    marker: String,
    digits: usize,
}

impl AccountNumberGuardrail {
    pub fn new(marker: impl Into<String>, digits: usize) -> Self {
        Self {
            marker: marker.into().to_ascii_lowercase(),
            digits,
        }
    }

    /// Run the check and return the typed verdict
    pub fn verdict(&self, payload: &str) -> AccountCheck {
        let candidate = trailing_token(payload, &self.marker);
        let is_valid = candidate
            .as_deref()
            .is_some_and(|token| is_account_number(token, self.digits));

        AccountCheck {
            is_valid,
            reason: if is_valid {
                "Account number is valid".to_string()
            } else {
                "Invalid or missing account number".to_string()
            },
            account_number: candidate,
        }
    }
}

impl Default for AccountNumberGuardrail {
    fn default() -> Self {
        Self::new("account number", 16)
    }
}

impl Guardrail for AccountNumberGuardrail {
    fn name(&self) -> &str {
        ACCOUNT_GUARDRAIL
    }

    fn kind(&self) -> GuardrailKind {
        GuardrailKind::Input
    }

    fn check(&self, _context: &BankContext, payload: &str) -> GuardrailResult {
        let verdict = self.verdict(payload);
        GuardrailResult {
            guardrail: ACCOUNT_GUARDRAIL.to_string(),
            kind: GuardrailKind::Input,
            tripwire_triggered: !verdict.is_valid,
            output_info: serde_json::to_value(&verdict).unwrap_or_default(),
        }
    }
}

fn is_account_number(token: &str, digits: usize) -> bool {
    token.len() == digits && token.bytes().all(|b| b.is_ascii_digit())
}

/// Last whitespace-separated token following the last occurrence of `marker`.
///
/// `marker` must already be ASCII-lowercased. Matching is done on an ASCII-lowercased
/// copy so byte offsets line up with the original text.
fn trailing_token(payload: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let haystack = payload.to_ascii_lowercase();
    let start = haystack.rfind(marker)? + marker.len();
    payload
        .get(start..)?
        .split_whitespace()
        .last()
        .map(str::to_string)
}
