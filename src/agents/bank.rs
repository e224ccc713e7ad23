//! The built-in bank assistant agents
//!
//! Triage validates the account number and hands off to the balance or
//! transaction specialist. Both specialists run the politeness guardrail on
//! their replies.

use super::definition::{AgentDefinition, AgentRole};
use super::registry::AgentRegistry;
use crate::error::TellerResult;
use crate::guardrails::{ACCOUNT_GUARDRAIL, POLITENESS_GUARDRAIL};

pub const TRIAGE_AGENT: &str = "TriageAgent";
pub const BALANCE_AGENT: &str = "BalanceAgent";
pub const TRANSACTION_AGENT: &str = "TransactionAgent";

const TRIAGE_INSTRUCTIONS: &str = "You are a bank customer service agent. Route queries to the \
BalanceAgent for balance inquiries or the TransactionAgent for transaction requests. Ask for the \
account number if it was not provided.";

const BALANCE_INSTRUCTIONS: &str = "You provide account balance information. Use the account \
number and balance from the account state and report the balance in a friendly manner.";

const TRANSACTION_INSTRUCTIONS: &str = "You process transaction requests. Confirm the transaction \
amount and the updated balance given in the account state. Only confirm transfers the account \
state marks as approved.";

/// Registry with the triage, balance and transaction agents on `model_id`
pub fn bank_registry(model_id: &str) -> TellerResult<AgentRegistry> {
    let mut registry = AgentRegistry::new();

    registry.register(
        AgentDefinition::new(TRIAGE_AGENT, AgentRole::Triage, TRIAGE_INSTRUCTIONS, model_id)
            .with_input_guardrail(ACCOUNT_GUARDRAIL)
            .with_handoff(BALANCE_AGENT)
            .with_handoff(TRANSACTION_AGENT),
    )?;

    registry.register(
        AgentDefinition::new(BALANCE_AGENT, AgentRole::Balance, BALANCE_INSTRUCTIONS, model_id)
            .with_handles(["balance", "inquiry", "how much", "statement"])
            .with_output_guardrail(POLITENESS_GUARDRAIL),
    )?;

    registry.register(
        AgentDefinition::new(
            TRANSACTION_AGENT,
            AgentRole::Transaction,
            TRANSACTION_INSTRUCTIONS,
            model_id,
        )
        .with_handles(["transfer", "payment", "pay", "send", "withdraw"])
        .with_output_guardrail(POLITENESS_GUARDRAIL),
    )?;

    Ok(registry)
}
