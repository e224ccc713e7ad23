//! Per-conversation account state
//!
//! A `BankContext` is owned by the caller and lent mutably to the router for
//! the length of one run. Only staged specialist effects change it, and only
//! after the run has been accepted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankContext {
    pub account_number: Option<String>,
    pub balance: Decimal,
}

impl BankContext {
    pub fn new(balance: Decimal) -> Self {
        Self {
            account_number: None,
            balance,
        }
    }

    pub fn with_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    /// Balance rendered with two decimal places
    pub fn display_balance(&self) -> String {
        format_money(self.balance)
    }

    /// Auxiliary state handed to the completion client.
    ///
    /// `query_account` fills in the account number when the context does not
    /// carry one yet; the context itself is left untouched.
    pub fn snapshot(&self, query_account: Option<&str>) -> Value {
        let account_number = self.account_number.as_deref().or(query_account);
        json!({
            "account_number": account_number,
            "balance": self.display_balance(),
        })
    }
}

impl Default for BankContext {
    fn default() -> Self {
        Self::new(Decimal::ONE_THOUSAND)
    }
}

/// Format an amount of money as `$1234.50`
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}
