//! Keyword handoff classifier
//!
//! For the current agent, each declared handoff target whose `handles`
//! vocabulary appears in the query (whole words, case-insensitive) is a
//! candidate. Exactly one candidate means a handoff; none or several means the
//! current agent keeps the turn.

use crate::agents::{AgentDefinition, AgentRegistry};
use crate::error::{TellerError, TellerResult};
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffDecision {
    Stay,
    Handoff(String),
    /// Several specialists matched; the current agent must ask for clarification
    Ambiguous(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct HandoffClassifier {
    vocabulary: HashMap<String, Regex>,
}

impl HandoffClassifier {
    /// Compile one matcher per agent that declares a vocabulary
    pub fn new(registry: &AgentRegistry) -> TellerResult<Self> {
        let mut vocabulary = HashMap::new();
        for agent in registry.agents() {
            let words: Vec<String> = agent
                .handles
                .iter()
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .map(regex::escape)
                .collect();
            if words.is_empty() {
                continue;
            }

            let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
            let matcher = Regex::new(&pattern).map_err(|e| {
                TellerError::configuration(format!(
                    "agent '{}' has an unusable handoff vocabulary: {e}",
                    agent.name
                ))
            })?;
            vocabulary.insert(agent.name.clone(), matcher);
        }
        Ok(Self { vocabulary })
    }

    pub fn classify(&self, agent: &AgentDefinition, query: &str) -> HandoffDecision {
        let mut candidates: Vec<String> = agent
            .handoffs
            .iter()
            .filter(|target| {
                self.vocabulary
                    .get(target.as_str())
                    .is_some_and(|matcher| matcher.is_match(query))
            })
            .cloned()
            .collect();

        debug!(agent = %agent.name, ?candidates, "Classified query for handoff");

        match candidates.len() {
            0 => HandoffDecision::Stay,
            1 => HandoffDecision::Handoff(candidates.remove(0)),
            _ => HandoffDecision::Ambiguous(candidates),
        }
    }
}
