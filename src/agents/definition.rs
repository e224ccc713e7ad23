//! Agent definitions
//!
//! Definitions are plain data built at startup. What an agent actually does
//! during its turn is decided by its [`AgentRole`].

use crate::guardrails::GuardrailRef;
use serde::{Deserialize, Serialize};

/// Behaviour variant of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Front desk: routes to specialists, otherwise asks a clarifying question
    Triage,
    /// Reports the balance from the context
    Balance,
    /// Debits the context balance for a valid transfer
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Unique within a registry
    pub name: String,
    pub instructions: String,
    pub model_id: String,
    pub role: AgentRole,
    /// Keywords that make a query a good fit for this agent (used for handoffs)
    #[serde(default)]
    pub handles: Vec<String>,
    #[serde(default)]
    pub input_guardrails: Vec<GuardrailRef>,
    #[serde(default)]
    pub output_guardrails: Vec<GuardrailRef>,
    /// Names of agents this one may hand off to, in declared order
    #[serde(default)]
    pub handoffs: Vec<String>,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        role: AgentRole,
        instructions: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model_id: model_id.into(),
            role,
            handles: Vec::new(),
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    pub fn with_handles<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handles = handles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input_guardrail(mut self, guardrail: impl Into<GuardrailRef>) -> Self {
        self.input_guardrails.push(guardrail.into());
        self
    }

    pub fn with_output_guardrail(mut self, guardrail: impl Into<GuardrailRef>) -> Self {
        self.output_guardrails.push(guardrail.into());
        self
    }

    /// Add a handoff target; duplicates are ignored
    pub fn with_handoff(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        if !self.handoffs.contains(&target) {
            self.handoffs.push(target);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let agent = AgentDefinition::new("TriageAgent", AgentRole::Triage, "route", "model")
            .with_input_guardrail("account_number")
            .with_handoff("BalanceAgent")
            .with_handoff("BalanceAgent")
            .with_handles(["help"]);

        assert_eq!(agent.input_guardrails, vec!["account_number"]);
        assert_eq!(agent.handoffs, vec!["BalanceAgent"]);
        assert_eq!(agent.handles, vec!["help"]);
        assert!(agent.output_guardrails.is_empty());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&AgentRole::Transaction).unwrap(),
            "\"transaction\""
        );
    }
}
