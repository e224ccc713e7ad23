//! Politeness output guardrail
//!
//! A reply passes iff it contains none of the configured apology or error
//! keywords (case-insensitive substring match). This is a crude proxy for a
//! professional tone, not a semantic check: "errorless" trips it and a rude
//! reply without the keywords passes.

use super::{Guardrail, GuardrailKind, GuardrailResult};
use crate::context::BankContext;
use serde::{Deserialize, Serialize};

pub const POLITENESS_GUARDRAIL: &str = "politeness";

/// Structured verdict stored in `GuardrailResult::output_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolitenessCheck {
    pub is_polite: bool,
    pub reason: String,
    /// First blacklisted keyword found, if any
    pub matched_keyword: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PolitenessGuardrail {
    keywords: Vec<String>,
}

impl PolitenessGuardrail {
    pub fn new<I, S>(apology_keywords: I, error_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = apology_keywords
            .into_iter()
            .chain(error_keywords)
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn verdict(&self, payload: &str) -> PolitenessCheck {
        let haystack = payload.to_lowercase();
        let matched_keyword = self
            .keywords
            .iter()
            .find(|keyword| haystack.contains(keyword.as_str()))
            .cloned();
        let is_polite = matched_keyword.is_none();

        PolitenessCheck {
            is_polite,
            reason: if is_polite {
                "Response is polite and professional".to_string()
            } else {
                "Response contains negative words".to_string()
            },
            matched_keyword,
        }
    }
}

impl Default for PolitenessGuardrail {
    fn default() -> Self {
        Self::new(["sorry"], ["error"])
    }
}

impl Guardrail for PolitenessGuardrail {
    fn name(&self) -> &str {
        POLITENESS_GUARDRAIL
    }

    fn kind(&self) -> GuardrailKind {
        GuardrailKind::Output
    }

    fn check(&self, _context: &BankContext, payload: &str) -> GuardrailResult {
        let verdict = self.verdict(payload);
        GuardrailResult {
            guardrail: POLITENESS_GUARDRAIL.to_string(),
            kind: GuardrailKind::Output,
            tripwire_triggered: !verdict.is_polite,
            output_info: serde_json::to_value(&verdict).unwrap_or_default(),
        }
    }
}
