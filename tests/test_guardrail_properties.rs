//! Property-based tests for the guardrails and transfer planning

use proptest::prelude::*;
use rust_decimal::Decimal;
use teller::agents::{AgentRole, ContextEffect, TurnPlan};
use teller::context::BankContext;
use teller::guardrails::{AccountNumberGuardrail, Guardrail, PolitenessGuardrail};

proptest! {
    #[test]
    fn account_without_marker_is_invalid(payload in "[a-z0-9 ?.]{0,60}") {
        prop_assume!(!payload.contains("account number"));
        let verdict = AccountNumberGuardrail::default().verdict(&payload);
        prop_assert!(!verdict.is_valid);
        prop_assert!(verdict.account_number.is_none());
    }

    #[test]
    fn sixteen_digits_after_marker_are_valid(
        prefix in "[A-Za-z?,. ]{0,30}",
        marker in prop::sample::select(vec!["Account Number", "account number", "ACCOUNT NUMBER", "Account number is"]),
        digits in "[0-9]{16}",
    ) {
        let payload = format!("{prefix} {marker} {digits}");
        let verdict = AccountNumberGuardrail::default().verdict(&payload);
        prop_assert!(verdict.is_valid, "rejected: {}", payload);
        prop_assert_eq!(verdict.account_number.as_deref(), Some(digits.as_str()));
    }

    #[test]
    fn wrong_length_is_invalid(
        digits in prop_oneof!["[0-9]{1,15}", "[0-9]{17,24}"],
    ) {
        let payload = format!("Balance? Account number {digits}");
        prop_assert!(!AccountNumberGuardrail::default().verdict(&payload).is_valid);
    }

    #[test]
    fn non_digit_characters_invalidate(
        head in "[0-9]{8}",
        junk in "[a-zA-Z\\-]",
        tail in "[0-9]{7}",
    ) {
        let payload = format!("Account number {head}{junk}{tail}");
        prop_assert!(!AccountNumberGuardrail::default().verdict(&payload).is_valid);
    }

    #[test]
    fn blacklisted_keyword_always_trips(
        before in "[a-z ]{0,20}",
        keyword in prop::sample::select(vec!["sorry", "Sorry", "SORRY", "error", "Error", "ERRORS"]),
        after in "[a-z .!]{0,20}",
    ) {
        let payload = format!("{before}{keyword}{after}");
        let result = PolitenessGuardrail::default().check(&BankContext::default(), &payload);
        prop_assert!(result.tripwire_triggered, "passed: {}", payload);
    }

    #[test]
    fn text_without_blacklisted_letters_passes(payload in "[a-np-zA-NP-Z0-9 $.,!]{0,80}") {
        let result = PolitenessGuardrail::default().check(&BankContext::default(), &payload);
        prop_assert!(!result.tripwire_triggered);
    }

    #[test]
    fn guardrail_verdicts_are_deterministic(payload in ".{0,80}") {
        let context = BankContext::default();
        let account = AccountNumberGuardrail::default();
        let politeness = PolitenessGuardrail::default();
        prop_assert_eq!(account.check(&context, &payload), account.check(&context, &payload));
        prop_assert_eq!(politeness.check(&context, &payload), politeness.check(&context, &payload));
    }

    #[test]
    fn transfer_debits_only_whole_cent_amounts_within_balance(
        balance_cents in 0i64..200_000,
        amount_mills in -10_000i64..3_000_000,
    ) {
        let balance = Decimal::new(balance_cents, 2);
        let amount = Decimal::new(amount_mills, 3);
        let mut context = BankContext::new(balance);
        let query = format!("Transfer ${amount}. Account number is 1234567890123456");

        let approvable = amount > Decimal::ZERO
            && amount <= balance
            && amount.normalize().scale() <= 2;

        match AgentRole::Transaction.plan(&query, &context) {
            TurnPlan::Consult { effect: Some(effect), .. } => {
                prop_assert!(approvable, "debit staged for {} against {}", amount, balance);
                prop_assert_eq!(effect, ContextEffect::Debit(amount));
                prop_assert!(effect.apply(&mut context).is_ok());
                prop_assert_eq!(context.balance, balance - amount);
                prop_assert!(context.balance >= Decimal::ZERO);
            }
            TurnPlan::Consult { effect: None, .. } => {
                prop_assert!(false, "transfer planned without an effect for {}", amount);
            }
            TurnPlan::Reply(_) => {
                prop_assert!(!approvable, "refused {} against {}", amount, balance);
                prop_assert_eq!(context.balance, balance);
            }
        }
    }
}
