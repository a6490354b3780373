// ABOUTME: Scripted reasoning service that replays canned replies for orchestrator tests
// ABOUTME: Records every request so tests can inspect the transcript the orchestrator built
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use haulsight_server::errors::{AppError, AppResult};
use haulsight_server::llm::{
    ChatRequest, FunctionCall, FunctionDeclaration, LlmCapabilities, ReasoningReply,
    ReasoningService,
};
use serde_json::Value;

/// Replays scripted replies in order, then repeats the fallback reply
pub struct ScriptedReasoning {
    replies: Mutex<VecDeque<AppResult<ReasoningReply>>>,
    fallback: Option<ReasoningReply>,
    requests: Mutex<Vec<ChatRequest>>,
    configured: bool,
    delay: Option<Duration>,
}

impl ScriptedReasoning {
    /// Service that returns `replies` one per call
    pub fn new(replies: Vec<AppResult<ReasoningReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            configured: true,
            delay: None,
        }
    }

    /// Service that answers immediately
    pub fn answering(text: &str) -> Self {
        Self::new(vec![Ok(final_answer(text))])
    }

    /// Reply used once the script runs out
    #[must_use]
    pub fn then_repeat(mut self, reply: ReasoningReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Report missing credentials
    #[must_use]
    pub const fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Sleep before every reply
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of reasoning calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::tool_calling()
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn reason(
        &self,
        request: &ChatRequest,
        _tools: &[FunctionDeclaration],
    ) -> AppResult<ReasoningReply> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(AppError::internal("script exhausted")),
        }
    }
}

/// Final text reply
pub fn final_answer(text: &str) -> ReasoningReply {
    ReasoningReply::Final {
        content: text.to_owned(),
    }
}

/// One function call
pub fn call(id: &str, name: &str, args: Value) -> FunctionCall {
    FunctionCall {
        id: id.to_owned(),
        name: name.to_owned(),
        args,
    }
}

/// Tool-call reply with optional thinking text
pub fn tool_calls(thinking: Option<&str>, calls: Vec<FunctionCall>) -> ReasoningReply {
    ReasoningReply::ToolCalls {
        thinking: thinking.map(str::to_owned),
        calls,
    }
}
