// ABOUTME: Investigation request, validated question, reasoning steps and response DTOs
// ABOUTME: Wire format is camelCase JSON; the validated Question is immutable once built
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::visualization::Visualization;
use crate::constants::answers::INVALID_REQUEST_ANSWER;
use crate::errors::{AppError, AppResult, ErrorResponseDetails};

// ============================================================================
// Processing Mode
// ============================================================================

/// Processing mode selected for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Short factual or count questions
    Quick,
    /// Chart, breakdown and comparison questions
    Visual,
    /// Explanatory or root-cause questions
    Deep,
}

impl ProcessingMode {
    /// All modes in budget order
    pub const ALL: [Self; 3] = [Self::Quick, Self::Visual, Self::Deep];

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Visual => "visual",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "visual" => Ok(Self::Visual),
            "deep" => Ok(Self::Deep),
            other => Err(AppError::invalid_input(format!(
                "Unknown processing mode '{other}' (expected quick, visual or deep)"
            ))),
        }
    }
}

/// Result of mode classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Detected (or forced) mode
    pub detected: ProcessingMode,
    /// Fixed confidence of the matching rule
    pub confidence: f64,
    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// Conversation
// ============================================================================

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person asking
    User,
    /// The assistant
    Assistant,
}

/// One prior exchange supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker
    pub role: TurnRole,
    /// Message text
    pub content: String,
}

impl ConversationTurn {
    /// Turn spoken by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Turn spoken by the assistant
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Inbound Request
// ============================================================================

/// Caller preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Include the reasoning trace in the response (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_reasoning: Option<bool>,
    /// Skip classification and use this mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_mode: Option<ProcessingMode>,
}

/// Raw inbound investigation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationRequest {
    /// Free-text question
    #[serde(default)]
    pub question: Option<String>,
    /// Tenant scope for every query
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Optional requesting user
    #[serde(default)]
    pub user_id: Option<String>,
    /// Prior turns of the conversation
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    /// Caller preferences
    #[serde(default)]
    pub preferences: Preferences,
}

impl InvestigationRequest {
    /// Validate the request into an immutable [`Question`]
    ///
    /// # Errors
    ///
    /// Returns a `MissingRequiredField` error when `question` or `customerId`
    /// is absent or blank.
    pub fn into_question(self) -> AppResult<Question> {
        let text = self.question.unwrap_or_default();
        let customer_id = self.customer_id.unwrap_or_default();
        let mut question = Question::new(text, customer_id)?
            .with_history(self.conversation_history)
            .with_show_reasoning(self.preferences.show_reasoning.unwrap_or(true));
        if let Some(mode) = self.preferences.force_mode {
            question = question.with_forced_mode(mode);
        }
        if let Some(user_id) = self.user_id.filter(|u| !u.trim().is_empty()) {
            question = question.with_user_id(user_id);
        }
        Ok(question)
    }
}

/// Validated, immutable question for one investigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    customer_id: String,
    user_id: Option<String>,
    history: Vec<ConversationTurn>,
    show_reasoning: bool,
    forced_mode: Option<ProcessingMode>,
}

impl Question {
    /// Build a question, rejecting blank text or customer
    ///
    /// # Errors
    ///
    /// Returns a `MissingRequiredField` error for a blank question or customer id.
    pub fn new(text: impl Into<String>, customer_id: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        let customer_id = customer_id.into();
        if text.trim().is_empty() {
            return Err(AppError::missing_field("question"));
        }
        if customer_id.trim().is_empty() {
            return Err(AppError::missing_field("customerId"));
        }
        Ok(Self {
            text: text.trim().to_owned(),
            customer_id: customer_id.trim().to_owned(),
            user_id: None,
            history: Vec::new(),
            show_reasoning: true,
            forced_mode: None,
        })
    }

    /// Attach prior conversation turns
    #[must_use]
    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Force a processing mode
    #[must_use]
    pub const fn with_forced_mode(mut self, mode: ProcessingMode) -> Self {
        self.forced_mode = Some(mode);
        self
    }

    /// Toggle the reasoning trace in the response
    #[must_use]
    pub const fn with_show_reasoning(mut self, show: bool) -> Self {
        self.show_reasoning = show;
        self
    }

    /// Attach the requesting user
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Question text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tenant scope
    #[must_use]
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Requesting user, if supplied
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Prior turns
    #[must_use]
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Whether the reasoning trace is returned
    #[must_use]
    pub const fn show_reasoning(&self) -> bool {
        self.show_reasoning
    }

    /// Caller-forced mode
    #[must_use]
    pub const fn forced_mode(&self) -> Option<ProcessingMode> {
        self.forced_mode
    }
}

// ============================================================================
// Reasoning Trace
// ============================================================================

/// One entry of the reasoning trace, in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ReasoningStep {
    /// Mode routing decision made before the first turn
    Routing {
        /// Selected mode
        mode: ProcessingMode,
        /// Rule confidence
        confidence: f64,
        /// Why the mode was chosen
        reason: String,
    },
    /// Free text the model produced alongside tool calls
    Thinking {
        /// Turn number (1-based)
        turn: usize,
        /// Model text
        content: String,
    },
    /// A tool the model asked to run
    ToolCall {
        /// Turn number (1-based)
        turn: usize,
        /// Reasoning-service call id
        call_id: String,
        /// Tool name as requested
        tool: String,
        /// Raw arguments
        arguments: Value,
    },
    /// Outcome of a tool call
    ToolResult {
        /// Turn number (1-based)
        turn: usize,
        /// Reasoning-service call id
        call_id: String,
        /// Tool name as requested
        tool: String,
        /// Whether the query succeeded
        success: bool,
        /// Rows or groups returned
        row_count: usize,
        /// One-line summary
        summary: String,
    },
}

// ============================================================================
// Outbound Response
// ============================================================================

/// Suggested next question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    /// Stable id (`followup-1`..)
    pub id: String,
    /// Question text
    pub question: String,
}

/// How the investigation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The model produced a final answer
    Answered,
    /// The turn budget ran out
    Exhausted,
    /// The reasoning service failed
    Failed,
    /// The caller cancelled
    Cancelled,
    /// The request failed validation
    Rejected,
}

impl Outcome {
    /// Whether the response reports `success: true`
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Answered | Self::Exhausted)
    }
}

/// Response metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Wall-clock processing time
    pub processing_time_ms: u64,
    /// Tool calls dispatched
    pub tool_call_count: usize,
    /// Reasoning turns used
    pub turns_used: usize,
    /// Terminal state
    pub outcome: Outcome,
    /// Mode used, absent for rejected requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ProcessingMode>,
    /// Classification detail, absent for rejected requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

/// Outbound investigation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationResponse {
    /// Whether the investigation produced an answer
    pub success: bool,
    /// Final (never empty) answer text
    pub answer: String,
    /// Reasoning trace, empty when hidden
    pub reasoning: Vec<ReasoningStep>,
    /// Suggested follow-ups
    pub follow_up_questions: Vec<FollowUpQuestion>,
    /// Chart descriptors
    pub visualizations: Vec<Visualization>,
    /// Metadata
    pub metadata: ResponseMetadata,
    /// Error detail for rejected requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponseDetails>,
}

impl InvestigationResponse {
    /// Response for a request that failed validation
    #[must_use]
    pub fn rejected(error: &AppError, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            answer: INVALID_REQUEST_ANSWER.to_owned(),
            reasoning: Vec::new(),
            follow_up_questions: Vec::new(),
            visualizations: Vec::new(),
            metadata: ResponseMetadata {
                processing_time_ms,
                tool_call_count: 0,
                turns_used: 0,
                outcome: Outcome::Rejected,
                mode: None,
                classification: None,
            },
            error: Some(ErrorResponseDetails::from(error)),
        }
    }
}
