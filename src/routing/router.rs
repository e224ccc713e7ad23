//! Guardrail-gated routing state machine
//!
//! ```text
//! Start -> InputGuardrailCheck -> Rejected
//!                              -> Routed -> Handoff -> InputGuardrailCheck (target)
//!                                        -> Completion -> OutputGuardrailCheck -> Rejected
//!                                                                              -> Accepted
//! ```
//!
//! Guardrail history accumulates across handoffs. Guardrail rejections and
//! completion failures are returned as structured [`RunResult`]s; only
//! configuration errors and invariant violations come back as `Err`.

use crate::agents::{AgentDefinition, AgentRegistry, ContextEffect, TurnPlan};
use crate::config::TellerConfig;
use crate::context::BankContext;
use crate::error::{sanitize_error_message, TellerError, TellerResult};
use crate::guardrails::{AccountCheck, GuardrailEngine, GuardrailKind, GuardrailResult};
use crate::llm::client::{CompletionCall, CompletionClient};
use crate::llm::provider::LlmError;
use crate::routing::classifier::{HandoffClassifier, HandoffDecision};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Stage of a run, recorded in order in [`RunResult::stages`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    InputGuardrailCheck,
    Routed,
    Handoff,
    Completion,
    OutputGuardrailCheck,
    Rejected,
    Accepted,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Accepted,
    /// A guardrail tripped; expected and user-facing, not an error
    Rejected {
        guardrail: String,
        kind: GuardrailKind,
        reason: String,
    },
    /// The completion client failed or timed out; the context is untouched
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub final_output: String,
    pub final_context: BankContext,
    /// Every guardrail evaluated during the run, passed or tripped
    pub triggered_guardrails: Vec<GuardrailResult>,
    /// Agents that held the turn, start agent first
    pub agent_path: Vec<String>,
    pub stages: Vec<RunStage>,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Accepted)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, RunOutcome::Rejected { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }

    /// Agent that produced the final output
    pub fn final_agent(&self) -> Option<&str> {
        self.agent_path.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterSettings {
    /// Handoffs allowed within one run before it counts as a loop
    pub max_handoffs: u32,
    /// Upper bound on one completion call
    pub completion_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_handoffs: 8,
            completion_timeout: Duration::from_secs(90),
        }
    }
}

impl From<&TellerConfig> for RouterSettings {
    fn from(config: &TellerConfig) -> Self {
        Self {
            max_handoffs: config.router.max_handoffs,
            completion_timeout: config.completion_timeout(),
        }
    }
}

/// Routes queries through agents. Cheap to clone; all state is shared and
/// read-only, so independent contexts can be routed concurrently.
#[derive(Clone)]
pub struct Router {
    registry: Arc<AgentRegistry>,
    engine: Arc<GuardrailEngine>,
    classifier: Arc<HandoffClassifier>,
    client: Arc<dyn CompletionClient>,
    settings: RouterSettings,
}

/// Bookkeeping for one run in progress
struct RunTrace {
    run_id: Uuid,
    guardrails: Vec<GuardrailResult>,
    agent_path: Vec<String>,
    stages: Vec<RunStage>,
}

impl RunTrace {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            guardrails: Vec::new(),
            agent_path: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn enter(&mut self, stage: RunStage) {
        debug!(run_id = %self.run_id, ?stage, "Run transition");
        self.stages.push(stage);
    }

    fn finish(mut self, final_output: String, context: &BankContext, outcome: RunOutcome) -> RunResult {
        match outcome {
            RunOutcome::Accepted => self.enter(RunStage::Accepted),
            _ => self.enter(RunStage::Rejected),
        }
        RunResult {
            run_id: self.run_id,
            final_output,
            final_context: context.clone(),
            triggered_guardrails: self.guardrails,
            agent_path: self.agent_path,
            stages: self.stages,
            outcome,
        }
    }
}

impl Router {
    /// Build a router, validating the agent graph against the guardrail engine
    pub fn new(
        registry: AgentRegistry,
        engine: GuardrailEngine,
        client: Arc<dyn CompletionClient>,
        settings: RouterSettings,
    ) -> TellerResult<Self> {
        if registry.is_empty() {
            return Err(TellerError::configuration("no agents registered"));
        }
        registry.validate(&engine)?;
        let classifier = HandoffClassifier::new(&registry)?;

        Ok(Self {
            registry: Arc::new(registry),
            engine: Arc::new(engine),
            classifier: Arc::new(classifier),
            client,
            settings,
        })
    }

    /// Router over the built-in bank agents, configured from `config`
    pub fn from_config(
        config: &TellerConfig,
        client: Arc<dyn CompletionClient>,
    ) -> TellerResult<Self> {
        let registry = crate::agents::bank::bank_registry(&config.llm.model)?;
        let engine = GuardrailEngine::from_config(&config.guardrails);
        let router = Self::new(registry, engine, client, RouterSettings::from(config))?;
        router.registry.resolve(&config.router.start_agent)?;
        Ok(router)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn settings(&self) -> RouterSettings {
        self.settings
    }

    /// Run one conversation turn starting at `start_agent`.
    ///
    /// The `&mut` borrow keeps at most one run in flight per context. The
    /// context only changes when the run ends `Accepted`.
    pub async fn route(
        &self,
        start_agent: &str,
        query: &str,
        context: &mut BankContext,
    ) -> TellerResult<RunResult> {
        let run_id = Uuid::new_v4();
        let span = crate::run_span!(run_id = %run_id, start_agent = start_agent);
        self.route_inner(run_id, start_agent, query, context)
            .instrument(span)
            .await
    }

    async fn route_inner(
        &self,
        run_id: Uuid,
        start_agent: &str,
        query: &str,
        context: &mut BankContext,
    ) -> TellerResult<RunResult> {
        let mut trace = RunTrace::new(run_id);
        let mut agent = self.registry.resolve(start_agent)?;
        let mut handoffs = 0u32;
        let mut query_account: Option<String> = None;

        info!(query_len = query.len(), "Routing query");

        loop {
            let _turn = crate::agent_span!(agent = %agent.name).entered();
            trace.agent_path.push(agent.name.clone());
            trace.enter(RunStage::InputGuardrailCheck);

            for guardrail in &agent.input_guardrails {
                let result = self.engine.evaluate(guardrail, GuardrailKind::Input, context, query)?;
                let tripped = result.tripwire_triggered;
                if !tripped {
                    if let Ok(check) = serde_json::from_value::<AccountCheck>(result.output_info.clone()) {
                        query_account = check.account_number.or(query_account);
                    }
                }
                trace.guardrails.push(result);

                if tripped {
                    return Ok(self.reject(trace, context, GuardrailKind::Input, &agent.name));
                }
            }

            trace.enter(RunStage::Routed);
            match self.classifier.classify(agent, query) {
                HandoffDecision::Handoff(target) => {
                    handoffs += 1;
                    if handoffs > self.settings.max_handoffs {
                        return Err(TellerError::invariant(format!(
                            "run exceeded {} handoffs (path: {})",
                            self.settings.max_handoffs,
                            trace.agent_path.join(" -> ")
                        )));
                    }
                    trace.enter(RunStage::Handoff);
                    info!(from = %agent.name, to = %target, "Handing off");
                    agent = self.registry.resolve(&target).map_err(|_| {
                        TellerError::invariant(format!(
                            "agent '{}' handed off to unregistered agent '{target}'",
                            agent.name
                        ))
                    })?;
                }
                HandoffDecision::Ambiguous(candidates) => {
                    debug!(agent = %agent.name, ?candidates, "Ambiguous query, keeping the turn");
                    break;
                }
                HandoffDecision::Stay => break,
            }
        }

        trace.enter(RunStage::Completion);
        let (candidate, effect) = match agent.role.plan(query, context) {
            TurnPlan::Reply(text) => (text, None),
            TurnPlan::Consult { effect, note } => {
                let call = self.completion_call(agent, query, context, query_account.as_deref(), note);
                match self.complete(call).await {
                    Ok(text) => (text, effect),
                    Err(e) => return Ok(self.fail(trace, context, e)),
                }
            }
        };

        trace.enter(RunStage::OutputGuardrailCheck);
        for guardrail in &agent.output_guardrails {
            let result = self.engine.evaluate(guardrail, GuardrailKind::Output, context, &candidate)?;
            let tripped = result.tripwire_triggered;
            trace.guardrails.push(result);

            if tripped {
                return Ok(self.reject(trace, context, GuardrailKind::Output, &agent.name));
            }
        }

        if let Some(effect) = effect {
            self.commit(effect, context)?;
        }

        info!(agent = %agent.name, "Run accepted");
        Ok(trace.finish(candidate, context, RunOutcome::Accepted))
    }

    fn completion_call(
        &self,
        agent: &AgentDefinition,
        query: &str,
        context: &BankContext,
        query_account: Option<&str>,
        note: Option<String>,
    ) -> CompletionCall {
        let mut state = context.snapshot(query_account);
        if let (Some(note), Some(map)) = (note, state.as_object_mut()) {
            map.insert("turn_note".to_string(), note.into());
        }

        CompletionCall {
            model: agent.model_id.clone(),
            instructions: agent.instructions.clone(),
            query: query.to_string(),
            context: state,
        }
    }

    /// Invoke the client under the configured deadline
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError> {
        let deadline = self.settings.completion_timeout;
        match tokio::time::timeout(deadline, self.client.complete(call)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(format!(
                "no completion within {}s",
                deadline.as_secs_f64()
            ))),
        }
    }

    fn commit(&self, effect: ContextEffect, context: &mut BankContext) -> TellerResult<()> {
        let before = context.balance;
        if let Err(e) = effect.apply(context) {
            tracing::error!(?effect, %before, "Refusing context effect: {}", e);
            return Err(e);
        }
        info!(?effect, %before, after = %context.balance, "Context effect committed");
        Ok(())
    }

    fn reject(
        &self,
        trace: RunTrace,
        context: &BankContext,
        kind: GuardrailKind,
        agent: &str,
    ) -> RunResult {
        let tripped = trace
            .guardrails
            .last()
            .cloned()
            .filter(|r| r.tripwire_triggered);
        let (guardrail, reason) = tripped
            .map(|r| {
                let reason = r.reason().unwrap_or("guardrail tripped").to_string();
                (r.guardrail, reason)
            })
            .unwrap_or_else(|| ("unknown".to_string(), "guardrail tripped".to_string()));

        warn!(%agent, %guardrail, %kind, %reason, "Guardrail tripwire triggered");

        let final_output = match kind {
            GuardrailKind::Input => format!("Unable to process this request: {reason}."),
            GuardrailKind::Output => {
                format!("The {agent} reply was withheld by the {guardrail} check: {reason}.")
            }
        };

        trace.finish(
            final_output,
            context,
            RunOutcome::Rejected {
                guardrail,
                kind,
                reason,
            },
        )
    }

    fn fail(&self, trace: RunTrace, context: &BankContext, error: LlmError) -> RunResult {
        let message = sanitize_error_message(&error.to_string());
        warn!(kind = error.kind(), %message, "Completion failed");

        trace.finish(
            format!(
                "The assistant is unavailable right now ({}). Please try again later.",
                error.kind()
            ),
            context,
            RunOutcome::Failed {
                kind: error.kind().to_string(),
                message,
            },
        )
    }
}
