//! Agent registry
//!
//! Holds the immutable set of agent definitions and checks, before any run,
//! that handoffs and guardrail references line up.

use super::definition::AgentDefinition;
use crate::error::{TellerError, TellerResult};
use crate::guardrails::{GuardrailEngine, GuardrailKind};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDefinition>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent; names must be unique
    pub fn register(&mut self, agent: AgentDefinition) -> TellerResult<()> {
        if agent.name.trim().is_empty() {
            return Err(TellerError::configuration("agent name must not be empty"));
        }
        if self.agents.contains_key(&agent.name) {
            return Err(TellerError::configuration(format!(
                "agent '{}' is already registered",
                agent.name
            )));
        }

        info!(
            agent = %agent.name,
            role = ?agent.role,
            handoffs = agent.handoffs.len(),
            "Registered agent"
        );
        self.agents.insert(agent.name.clone(), agent);
        Ok(())
    }

    /// Resolve an agent by name
    pub fn resolve(&self, name: &str) -> TellerResult<&AgentDefinition> {
        self.agents
            .get(name)
            .ok_or_else(|| TellerError::configuration(format!("unknown agent '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    /// Check every handoff target exists, no agent hands off to itself, and
    /// all guardrail references are registered on the right side
    pub fn validate(&self, engine: &GuardrailEngine) -> TellerResult<()> {
        for name in self.names() {
            let agent = &self.agents[name];
            for target in &agent.handoffs {
                if target == &agent.name {
                    return Err(TellerError::configuration(format!(
                        "agent '{name}' cannot hand off to itself"
                    )));
                }
                if !self.contains(target) {
                    return Err(TellerError::configuration(format!(
                        "agent '{name}' hands off to unregistered agent '{target}'"
                    )));
                }
            }

            engine
                .ensure_registered(&agent.input_guardrails, GuardrailKind::Input)
                .and_then(|_| {
                    engine.ensure_registered(&agent.output_guardrails, GuardrailKind::Output)
                })
                .map_err(|e| match e {
                    TellerError::Configuration { message } => {
                        TellerError::configuration(format!("agent '{name}': {message}"))
                    }
                    other => other,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::definition::AgentRole;
    use crate::config::GuardrailSection;

    fn agent(name: &str) -> AgentDefinition {
        AgentDefinition::new(name, AgentRole::Balance, "instructions", "model")
    }

    fn engine() -> GuardrailEngine {
        GuardrailEngine::from_config(&GuardrailSection::default())
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = AgentRegistry::new();
        registry.register(agent("BalanceAgent")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("BalanceAgent").unwrap().name, "BalanceAgent");
        assert!(matches!(
            registry.resolve("Nobody"),
            Err(TellerError::Configuration { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = AgentRegistry::new();
        registry.register(agent("BalanceAgent")).unwrap();
        assert!(registry.register(agent("BalanceAgent")).is_err());
    }

    #[test]
    fn test_self_handoff_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register(agent("Loop").with_handoff("Loop"))
            .unwrap();
        let error = registry.validate(&engine()).unwrap_err();
        assert!(error.to_string().contains("itself"));
    }

    #[test]
    fn test_unknown_handoff_target_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register(agent("Front").with_handoff("Ghost"))
            .unwrap();
        let error = registry.validate(&engine()).unwrap_err();
        assert!(error.to_string().contains("Ghost"));
    }

    #[test]
    fn test_guardrail_on_wrong_side_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register(agent("Front").with_input_guardrail("politeness"))
            .unwrap();
        assert!(registry.validate(&engine()).is_err());
    }

    #[test]
    fn test_unknown_guardrail_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register(agent("Front").with_output_guardrail("tone"))
            .unwrap();
        let error = registry.validate(&engine()).unwrap_err();
        assert!(matches!(error, TellerError::Configuration { .. }));
    }

    #[test]
    fn test_valid_graph_passes() {
        let mut registry = AgentRegistry::new();
        registry
            .register(
                agent("Front")
                    .with_input_guardrail("account_number")
                    .with_handoff("Back"),
            )
            .unwrap();
        registry
            .register(agent("Back").with_output_guardrail("politeness"))
            .unwrap();
        assert!(registry.validate(&engine()).is_ok());
        assert_eq!(registry.names(), vec!["Back", "Front"]);
    }
}
