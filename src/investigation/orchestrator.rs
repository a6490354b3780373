// ABOUTME: Bounded multi-turn investigation loop driving the reasoning service and the tool executor
// ABOUTME: Routes once, runs tool-calling turns under a budget and always returns a non-empty answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Investigation Orchestrator
//!
//! ```text
//! Routing ─▶ TurnActive(1) ─▶ … ─▶ TurnActive(max_turns)
//!                 │                       │
//!                 ├─▶ Answer              └─▶ Exhausted
//!                 ├─▶ Error
//!                 └─▶ Cancelled
//! ```
//!
//! Every turn sends the whole transcript plus the tool catalog. A text-only
//! reply ends the investigation. Otherwise every requested tool runs
//! concurrently; results are appended to the transcript in the order the
//! model requested them, one `user` message per call.
//!
//! The [`InvestigationTrace`] accumulates reasoning steps, charts and findings.
//! It is passed into each turn and handed back out, never shared.
//!
//! With a time budget configured, the reasoning call and the tool dispatch of
//! every turn are cut off at the deadline. Running out of time ends the loop
//! as `Exhausted`, the same as running out of turns.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use haulsight_analytics::QueryScope;
use haulsight_core::constants::answers::{
    CANCELLED_ANSWER, EXHAUSTED_EMPTY_ANSWER, EXHAUSTED_PREFIX, FALLBACK_ANSWER,
};
use haulsight_core::models::{
    Classification, FollowUpQuestion, InvestigationResponse, Outcome, ProcessingMode, Question,
    ReasoningStep, ResponseMetadata, TurnRole, Visualization,
};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::classifier::ModeClassifier;
use super::followups::{extract_follow_ups, generic_follow_ups, strip_follow_up_section};
use crate::config::{InvestigationConfig, ModeBudget};
use crate::errors::AppError;
use crate::llm::prompts::investigator_system_prompt;
use crate::llm::{
    ChatMessage, ChatRequest, FunctionCall, FunctionDeclaration, ReasoningReply, ReasoningService,
};
use crate::logging::AppLogger;
use crate::tools::{tool_catalog, ToolExecutor};
use crate::visualization::synthesize;

/// Sampling temperature for investigation turns
const REASONING_TEMPERATURE: f32 = 0.2;

/// Loop position, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestigationState {
    /// Classifying the question
    Routing,
    /// Running the given turn (1-based)
    TurnActive(usize),
    /// The model answered
    Answer,
    /// The turn or time budget ran out
    Exhausted,
    /// The reasoning service failed
    Error,
    /// The caller cancelled
    Cancelled,
}

impl InvestigationState {
    const fn outcome(self) -> Outcome {
        match self {
            Self::Routing | Self::TurnActive(_) | Self::Error => Outcome::Failed,
            Self::Answer => Outcome::Answered,
            Self::Exhausted => Outcome::Exhausted,
            Self::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Reasoning steps, charts and findings gathered so far
#[derive(Debug, Clone, Default)]
pub struct InvestigationTrace {
    steps: Vec<ReasoningStep>,
    visualizations: Vec<Visualization>,
    findings: Vec<String>,
    last_thinking: Option<String>,
    tool_call_count: usize,
    turns_used: usize,
}

impl InvestigationTrace {
    /// Steps in arrival order
    #[must_use]
    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    /// Charts in arrival order
    #[must_use]
    pub fn visualizations(&self) -> &[Visualization] {
        &self.visualizations
    }

    /// Tool calls dispatched
    #[must_use]
    pub const fn tool_call_count(&self) -> usize {
        self.tool_call_count
    }

    /// Reasoning calls made
    #[must_use]
    pub const fn turns_used(&self) -> usize {
        self.turns_used
    }

    fn record(mut self, step: ReasoningStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Bullet list of successful tool findings
    fn findings_digest(&self) -> Option<String> {
        (!self.findings.is_empty()).then(|| {
            self.findings
                .iter()
                .map(|finding| format!("- {finding}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

/// How one turn ended
enum TurnOutcome {
    /// Tools ran; take another turn
    Continue,
    /// The model answered
    Answered(String),
    /// The reasoning service failed
    Failed(AppError),
    /// The caller cancelled
    Cancelled,
    /// The time budget ran out mid-turn
    OutOfTime,
}

/// Inputs shared by every turn of one investigation
struct TurnContext<'a> {
    scope: &'a QueryScope,
    budget: ModeBudget,
    cancel: &'a CancellationToken,
    deadline: Option<Instant>,
}

impl TurnContext<'_> {
    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn out_of_time(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }
}

/// Drives investigations for one reasoning service and query engine
#[derive(Clone)]
pub struct InvestigationOrchestrator {
    reasoning: Arc<dyn ReasoningService>,
    executor: ToolExecutor,
    config: InvestigationConfig,
    tools: Arc<[FunctionDeclaration]>,
}

impl InvestigationOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        executor: ToolExecutor,
        config: InvestigationConfig,
    ) -> Self {
        Self {
            reasoning,
            executor,
            config,
            tools: tool_catalog().into(),
        }
    }

    /// Budgets and timeouts in effect
    #[must_use]
    pub const fn config(&self) -> &InvestigationConfig {
        &self.config
    }

    /// Investigate a question against the current time
    pub async fn investigate(
        &self,
        question: &Question,
        cancel: CancellationToken,
    ) -> InvestigationResponse {
        let scope = QueryScope::now(question.customer_id());
        self.investigate_with_scope(question, &scope, cancel).await
    }

    /// Investigate a question with an explicit tenant scope and clock
    #[instrument(
        skip_all,
        fields(customer_id = %scope.customer_id, user_id = question.user_id().unwrap_or("-"))
    )]
    pub async fn investigate_with_scope(
        &self,
        question: &Question,
        scope: &QueryScope,
        cancel: CancellationToken,
    ) -> InvestigationResponse {
        let started = Instant::now();
        debug!(state = ?InvestigationState::Routing, "Investigation state");

        let classification = ModeClassifier::classify(question.text(), question.forced_mode());
        let mode = classification.detected;
        let budget = self.config.budgets.for_mode(mode);
        info!(
            mode = %mode,
            confidence = classification.confidence,
            max_turns = budget.max_turns,
            "Question routed"
        );

        let mut trace = InvestigationTrace::default().record(ReasoningStep::Routing {
            mode,
            confidence: classification.confidence,
            reason: classification.reason.clone(),
        });
        let mut transcript = initial_transcript(question, mode, budget);
        let ctx = TurnContext {
            scope,
            budget,
            cancel: &cancel,
            deadline: self.config.time_budget.map(|limit| started + limit),
        };

        let terminal = if self.reasoning.is_configured() {
            let mut terminal = (InvestigationState::Exhausted, None);
            for turn in 1..=budget.max_turns {
                if cancel.is_cancelled() {
                    terminal = (InvestigationState::Cancelled, None);
                    break;
                }
                if ctx.out_of_time() {
                    info!(turn, "Time budget spent before turn");
                    break;
                }
                debug!(state = ?InvestigationState::TurnActive(turn), "Investigation state");
                let (next, outcome) = self.run_turn(turn, &ctx, &mut transcript, trace).await;
                trace = next;
                match outcome {
                    TurnOutcome::Continue => {}
                    TurnOutcome::Answered(text) => {
                        terminal = (InvestigationState::Answer, Some(text));
                        break;
                    }
                    TurnOutcome::Failed(error) => {
                        warn!(error = %error, turn, "Reasoning service failed");
                        terminal = (InvestigationState::Error, None);
                        break;
                    }
                    TurnOutcome::Cancelled => {
                        terminal = (InvestigationState::Cancelled, None);
                        break;
                    }
                    TurnOutcome::OutOfTime => {
                        info!(turn, "Time budget spent during turn");
                        break;
                    }
                }
            }
            terminal
        } else {
            warn!(provider = %self.reasoning.name(), "Reasoning service has no credentials");
            (InvestigationState::Error, None)
        };

        let (state, answer_text) = terminal;
        debug!(state = ?state, "Investigation state");
        let processing_time_ms = elapsed_ms(started);
        let outcome = state.outcome();
        AppLogger::log_investigation_complete(
            question.customer_id(),
            Some(mode),
            outcome,
            trace.turns_used,
            trace.tool_call_count,
            processing_time_ms,
        );

        build_response(
            state,
            answer_text,
            trace,
            classification,
            question.show_reasoning(),
            processing_time_ms,
        )
    }

    fn log_reasoning_call(&self, turn: usize, tool_calls: usize, success: bool, started: Instant) {
        AppLogger::log_reasoning_call(
            self.reasoning.name(),
            turn,
            tool_calls,
            success,
            elapsed_ms(started),
        );
    }

    /// One reasoning call plus the tools it requested
    async fn run_turn(
        &self,
        turn: usize,
        ctx: &TurnContext<'_>,
        transcript: &mut Vec<ChatMessage>,
        mut trace: InvestigationTrace,
    ) -> (InvestigationTrace, TurnOutcome) {
        let request = ChatRequest::new(transcript.clone())
            .with_max_tokens(ctx.budget.max_tokens)
            .with_temperature(REASONING_TEMPERATURE);
        let call_limit = ctx
            .remaining()
            .map_or(self.config.reasoning_timeout, |left| {
                left.min(self.config.reasoning_timeout)
            });

        trace.turns_used = turn;
        let call_started = Instant::now();
        let reply = match time::timeout(call_limit, self.reasoning.reason(&request, &self.tools))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => {
                self.log_reasoning_call(turn, 0, false, call_started);
                return (trace, TurnOutcome::Failed(error));
            }
            Err(_) if ctx.out_of_time() => {
                self.log_reasoning_call(turn, 0, false, call_started);
                return (trace, TurnOutcome::OutOfTime);
            }
            Err(_) => {
                self.log_reasoning_call(turn, 0, false, call_started);
                return (
                    trace,
                    TurnOutcome::Failed(AppError::timeout(
                        "Reasoning service",
                        self.config.reasoning_timeout.as_secs(),
                    )),
                );
            }
        };

        let (thinking, calls) = match reply {
            ReasoningReply::Final { content } => {
                self.log_reasoning_call(turn, 0, true, call_started);
                return (trace, TurnOutcome::Answered(content));
            }
            ReasoningReply::ToolCalls { thinking, calls } if calls.is_empty() => {
                self.log_reasoning_call(turn, 0, true, call_started);
                return (trace, TurnOutcome::Answered(thinking.unwrap_or_default()));
            }
            ReasoningReply::ToolCalls { thinking, calls } => (thinking, calls),
        };
        self.log_reasoning_call(turn, calls.len(), true, call_started);

        if let Some(text) = thinking.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            trace.last_thinking = Some(text.to_owned());
            trace = trace.record(ReasoningStep::Thinking {
                turn,
                content: text.to_owned(),
            });
        }
        transcript.push(ChatMessage::assistant(tool_request_message(
            thinking.as_deref(),
            &calls,
        )));
        for call in &calls {
            trace = trace.record(ReasoningStep::ToolCall {
                turn,
                call_id: call.id.clone(),
                tool: call.name.clone(),
                arguments: call.args.clone(),
            });
        }

        if ctx.cancel.is_cancelled() {
            return (trace, TurnOutcome::Cancelled);
        }
        trace.tool_call_count += calls.len();
        let dispatch = join_all(
            calls
                .iter()
                .map(|call| self.executor.execute(ctx.scope, call, ctx.cancel)),
        );
        let results = match ctx.deadline {
            Some(deadline) => match time::timeout_at(deadline, dispatch).await {
                Ok(results) => results,
                Err(_) => {
                    debug!(discarded = calls.len(), "Discarding tool calls past the time budget");
                    return (trace, TurnOutcome::OutOfTime);
                }
            },
            None => dispatch.await,
        };
        if ctx.cancel.is_cancelled() {
            debug!(discarded = results.len(), "Discarding tool results after cancellation");
            return (trace, TurnOutcome::Cancelled);
        }

        for (invocation, result) in results {
            if let Some(viz) = invocation
                .as_ref()
                .and_then(|invocation| synthesize(invocation, &result))
            {
                trace.visualizations.push(viz);
            }
            let summary = result.summary();
            if result.success {
                trace.findings.push(summary.clone());
            }
            transcript.push(ChatMessage::user(result.to_transcript_message()));
            trace = trace.record(ReasoningStep::ToolResult {
                turn,
                call_id: result.call_id,
                tool: result.tool,
                success: result.success,
                row_count: result.row_count,
                summary,
            });
        }

        (trace, TurnOutcome::Continue)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// System prompt, prior turns, then the question
fn initial_transcript(
    question: &Question,
    mode: ProcessingMode,
    budget: ModeBudget,
) -> Vec<ChatMessage> {
    let mut transcript = Vec::with_capacity(question.history().len() + 2);
    transcript.push(ChatMessage::system(investigator_system_prompt(mode, budget.max_turns)));
    transcript.extend(question.history().iter().map(|turn| match turn.role {
        TurnRole::User => ChatMessage::user(turn.content.clone()),
        TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    }));
    transcript.push(ChatMessage::user(question.text()));
    transcript
}

/// Assistant message echoing the requested calls into the transcript
fn tool_request_message(thinking: Option<&str>, calls: &[FunctionCall]) -> String {
    let mut lines: Vec<String> = thinking
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .into_iter()
        .collect();
    lines.extend(
        calls
            .iter()
            .map(|call| format!("Calling tool {} ({}) with {}", call.name, call.id, call.args)),
    );
    lines.join("\n")
}

fn build_response(
    state: InvestigationState,
    answer_text: Option<String>,
    trace: InvestigationTrace,
    classification: Classification,
    show_reasoning: bool,
    processing_time_ms: u64,
) -> InvestigationResponse {
    let digest = trace.findings_digest();
    let (answer, follow_up_questions): (String, Vec<FollowUpQuestion>) = match state {
        InvestigationState::Answer => {
            let text = answer_text.unwrap_or_default();
            if text.trim().is_empty() {
                let answer = digest.map_or_else(
                    || FALLBACK_ANSWER.to_owned(),
                    |d| format!("Here is what I found:\n{d}"),
                );
                (answer, generic_follow_ups())
            } else {
                let follow_ups = extract_follow_ups(&text);
                let body = strip_follow_up_section(&text);
                let answer = if body.is_empty() { text.trim() } else { body };
                (answer.to_owned(), follow_ups)
            }
        }
        InvestigationState::Exhausted => {
            let partial = trace.last_thinking.clone().or(digest).map_or_else(
                || EXHAUSTED_EMPTY_ANSWER.to_owned(),
                |p| format!("{EXHAUSTED_PREFIX}\n\n{p}"),
            );
            (partial, generic_follow_ups())
        }
        InvestigationState::Cancelled => {
            let partial = digest.map_or_else(
                || CANCELLED_ANSWER.to_owned(),
                |d| format!("{CANCELLED_ANSWER} Partial findings:\n{d}"),
            );
            (partial, Vec::new())
        }
        InvestigationState::Routing
        | InvestigationState::TurnActive(_)
        | InvestigationState::Error => (FALLBACK_ANSWER.to_owned(), Vec::new()),
    };

    let outcome = state.outcome();
    let mode = classification.detected;
    InvestigationResponse {
        success: outcome.is_success(),
        answer,
        reasoning: if show_reasoning { trace.steps } else { Vec::new() },
        follow_up_questions,
        visualizations: trace.visualizations,
        metadata: ResponseMetadata {
            processing_time_ms,
            tool_call_count: trace.tool_call_count,
            turns_used: trace.turns_used,
            outcome,
            mode: Some(mode),
            classification: Some(classification),
        },
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_request_message_lists_calls() {
        let calls = vec![FunctionCall {
            id: "call_1".to_owned(),
            name: "get_summary_stats".to_owned(),
            args: json!({}),
        }];
        let message = tool_request_message(Some("  Checking totals. "), &calls);
        assert_eq!(message, "Checking totals.\nCalling tool get_summary_stats (call_1) with {}");
    }

    #[test]
    fn test_exhausted_answer_uses_digest_without_thinking() {
        let trace = InvestigationTrace {
            findings: vec!["120 shipments".to_owned()],
            ..InvestigationTrace::default()
        };
        let classification = ModeClassifier::classify("How many shipments?", None);
        let response =
            build_response(InvestigationState::Exhausted, None, trace, classification, true, 5);
        assert!(response.success);
        assert!(response.answer.starts_with(EXHAUSTED_PREFIX));
        assert!(response.answer.contains("- 120 shipments"));
        assert_eq!(response.metadata.outcome, Outcome::Exhausted);
    }
}
