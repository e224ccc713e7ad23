//! What each agent role does during its turn
//!
//! Planning is pure: it looks at the query and the context and says whether
//! to consult the completion client (optionally staging a context effect) or
//! to answer locally. Staged effects are applied by the router only once the
//! run is accepted, so a failed or rejected run never changes the context.

use super::definition::AgentRole;
use crate::context::{format_money, BankContext};
use crate::error::{TellerError, TellerResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\$\s*(?P<marked>-?\d[\d,]*(?:\.\d+)?)|\b(?:transfer|pay|send|withdraw)\s+(?P<bare>-?\d[\d,]*(?:\.\d+)?)",
    )
    .expect("amount pattern is valid")
});

/// Outcome of planning one agent turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPlan {
    /// Ask the completion client; `note` is added to the auxiliary state
    Consult {
        effect: Option<ContextEffect>,
        note: Option<String>,
    },
    /// Answer without the completion client
    Reply(String),
}

/// A change to the context, staged until the run is accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextEffect {
    Debit(Decimal),
}

impl ContextEffect {
    /// Apply to the context. Overdrawing is an invariant violation: planning
    /// only stages debits it has already checked against the balance.
    pub fn apply(&self, context: &mut BankContext) -> TellerResult<()> {
        match *self {
            ContextEffect::Debit(amount) => {
                if amount <= Decimal::ZERO {
                    return Err(TellerError::invariant(format!(
                        "debit of non-positive amount {amount}"
                    )));
                }
                let remaining = context.balance - amount;
                if remaining < Decimal::ZERO {
                    return Err(TellerError::invariant(format!(
                        "debit of {amount} would leave balance {remaining}"
                    )));
                }
                context.balance = remaining;
                Ok(())
            }
        }
    }
}

impl AgentRole {
    pub fn plan(&self, query: &str, context: &BankContext) -> TurnPlan {
        match self {
            AgentRole::Triage => TurnPlan::Consult {
                effect: None,
                note: Some(
                    "No specialist was selected for this query. Ask one short clarifying \
                     question (balance inquiry or transaction) instead of guessing."
                        .to_string(),
                ),
            },
            AgentRole::Balance => TurnPlan::Consult {
                effect: None,
                note: None,
            },
            AgentRole::Transaction => plan_transaction(query, context),
        }
    }
}

fn plan_transaction(query: &str, context: &BankContext) -> TurnPlan {
    let amount = match parse_amount(query) {
        None => {
            return TurnPlan::Reply(
                "Please tell me the amount you would like to transfer, for example \"Transfer $200\"."
                    .to_string(),
            )
        }
        Some(RequestedAmount::Oversized { negative: true }) => return non_positive(context),
        Some(RequestedAmount::Oversized { negative: false }) => {
            return TurnPlan::Reply(format!(
                "Transfer declined: insufficient funds for the requested amount. \
                 Your balance remains {}.",
                context.display_balance()
            ))
        }
        Some(RequestedAmount::Exact(amount)) => amount,
    };

    if amount <= Decimal::ZERO {
        return non_positive(context);
    }

    if amount.normalize().scale() > 2 {
        return TurnPlan::Reply(format!(
            "Transfers are made in whole cents, so {amount} cannot be sent. \
             Your balance remains {}.",
            context.display_balance()
        ));
    }

    if amount > context.balance {
        return TurnPlan::Reply(format!(
            "Transfer of {} declined: insufficient funds. Your balance remains {}.",
            format_money(amount),
            context.display_balance()
        ));
    }

    TurnPlan::Consult {
        effect: Some(ContextEffect::Debit(amount)),
        note: Some(format!(
            "Approved transfer of {}. Balance after the transfer: {}. Confirm this to the customer.",
            format_money(amount),
            format_money(context.balance - amount)
        )),
    }
}

fn non_positive(context: &BankContext) -> TurnPlan {
    TurnPlan::Reply(format!(
        "The transfer amount must be greater than $0.00, so no funds were moved. \
         Your balance remains {}.",
        context.display_balance()
    ))
}

/// Amount found in a transaction query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestedAmount {
    Exact(Decimal),
    /// A figure too large to represent; it can never be covered by a balance
    Oversized { negative: bool },
}

/// Requested amount in a transaction query: a `$`-marked figure, or a number
/// directly after transfer/pay/send/withdraw. Thousands separators are ignored.
pub fn parse_amount(query: &str) -> Option<RequestedAmount> {
    let captures = AMOUNT_PATTERN.captures(query)?;
    let raw = captures
        .name("marked")
        .or_else(|| captures.name("bare"))?
        .as_str()
        .replace(',', "");
    Some(match Decimal::from_str(&raw) {
        Ok(amount) => RequestedAmount::Exact(amount),
        Err(_) => RequestedAmount::Oversized {
            negative: raw.starts_with('-'),
        },
    })
}
