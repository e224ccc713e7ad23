//! Named guardrail registry and evaluator

use super::{
    AccountNumberGuardrail, Guardrail, GuardrailKind, GuardrailResult, PolitenessGuardrail,
};
use crate::config::GuardrailSection;
use crate::context::BankContext;
use crate::error::{TellerError, TellerResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Holds every guardrail an agent may reference, keyed by name.
///
/// Built once at startup and shared read-only between runs.
#[derive(Clone, Default)]
pub struct GuardrailEngine {
    guardrails: HashMap<String, Arc<dyn Guardrail>>,
}

impl std::fmt::Debug for GuardrailEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.guardrails.keys().collect();
        names.sort();
        f.debug_struct("GuardrailEngine")
            .field("guardrails", &names)
            .finish()
    }
}

impl GuardrailEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the account-number and politeness guardrails
    pub fn from_config(section: &GuardrailSection) -> Self {
        let mut engine = Self::new();
        engine.insert(AccountNumberGuardrail::new(
            section.account_marker.clone(),
            section.account_digits,
        ));
        engine.insert(PolitenessGuardrail::new(
            section.apology_keywords.iter(),
            section.error_keywords.iter(),
        ));
        engine
    }

    /// Register a guardrail, failing if the name is already taken
    pub fn register(&mut self, guardrail: impl Guardrail + 'static) -> TellerResult<()> {
        if self.guardrails.contains_key(guardrail.name()) {
            return Err(TellerError::configuration(format!(
                "guardrail '{}' is already registered",
                guardrail.name()
            )));
        }
        self.insert(guardrail);
        Ok(())
    }

    fn insert(&mut self, guardrail: impl Guardrail + 'static) {
        self.guardrails
            .insert(guardrail.name().to_string(), Arc::new(guardrail));
    }

    pub fn kind_of(&self, name: &str) -> Option<GuardrailKind> {
        self.guardrails.get(name).map(|g| g.kind())
    }

    /// Fail fast if any reference is unknown or attached on the wrong side
    pub fn ensure_registered<'a>(
        &self,
        refs: impl IntoIterator<Item = &'a String>,
        expected: GuardrailKind,
    ) -> TellerResult<()> {
        for name in refs {
            match self.kind_of(name) {
                None => {
                    return Err(TellerError::configuration(format!(
                        "unknown guardrail '{name}'"
                    )))
                }
                Some(kind) if kind != expected => {
                    return Err(TellerError::configuration(format!(
                        "guardrail '{name}' is an {kind} guardrail, attached as {expected}"
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Evaluate one guardrail against a payload in an `expected` slot.
    ///
    /// Only an unknown reference or a slot mismatch is an error; malformed
    /// payloads just trip the wire.
    pub fn evaluate(
        &self,
        guardrail_ref: &str,
        expected: GuardrailKind,
        context: &BankContext,
        payload: &str,
    ) -> TellerResult<GuardrailResult> {
        let guardrail = self.guardrails.get(guardrail_ref).ok_or_else(|| {
            TellerError::configuration(format!("unknown guardrail '{guardrail_ref}'"))
        })?;
        if guardrail.kind() != expected {
            return Err(TellerError::configuration(format!(
                "guardrail '{guardrail_ref}' is an {} guardrail, evaluated as {expected}",
                guardrail.kind()
            )));
        }

        let _span = crate::guardrail_span!(guardrail = guardrail_ref).entered();
        let result = guardrail.check(context, payload);
        debug!(
            guardrail = guardrail_ref,
            kind = %result.kind,
            tripwire = result.tripwire_triggered,
            "Guardrail evaluated"
        );
        Ok(result)
    }
}
