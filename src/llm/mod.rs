// ABOUTME: Reasoning service abstraction for the tool-calling investigation loop
// ABOUTME: Defines chat messages, tool declarations, function calls and the discriminated reply type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Reasoning Service Provider Interface
//!
//! The orchestrator talks to an external chat-completions model through the
//! [`ReasoningService`] trait. Each call sends the transcript plus the tool
//! catalog and returns a [`ReasoningReply`]: either final text or a batch of
//! tool calls with optional thinking text.
//!
//! ## Example
//!
//! ```rust,no_run
//! use haulsight_server::llm::{ChatMessage, ChatRequest, ReasoningReply, ReasoningService};
//!
//! async fn example(service: &dyn ReasoningService) {
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("You analyze shipment data."),
//!         ChatMessage::user("How many shipments did we move last week?"),
//!     ])
//!     .with_max_tokens(1024);
//!
//!     if let Ok(ReasoningReply::Final { content }) = service.reason(&request, &[]).await {
//!         println!("{content}");
//!     }
//! }
//! ```

mod openai_compatible;
pub mod prompts;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppResult;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// Reasoning provider capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0001;
        /// Provider supports system messages
        const SYSTEM_MESSAGES = 0b0000_0010;
    }
}

impl LlmCapabilities {
    /// Capabilities every investigation provider needs
    #[must_use]
    pub const fn tool_calling() -> Self {
        Self::FUNCTION_CALLING.union(Self::SYSTEM_MESSAGES)
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if system messages are supported
    #[must_use]
    pub const fn supports_system_messages(&self) -> bool {
        self.contains(Self::SYSTEM_MESSAGES)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input or tool result
    User,
    /// Model output
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Declarative description of one callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Tool name
    pub name: String,
    /// What the tool does, written for the model
    pub description: String,
    /// JSON Schema of the argument object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    /// Name of the function to call
    pub name: String,
    /// Arguments as a JSON object; a raw string when the model sent invalid JSON
    pub args: Value,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Outcome of one reasoning call
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningReply {
    /// The model answered without requesting tools
    Final {
        /// Answer text
        content: String,
    },
    /// The model requested one or more tools
    ToolCalls {
        /// Text emitted alongside the calls, if any
        thinking: Option<String>,
        /// Calls in the order the model listed them
        calls: Vec<FunctionCall>,
    },
}

// ============================================================================
// Service Trait
// ============================================================================

/// External reasoning service used by the investigation orchestrator
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Provider identifier for logs (e.g. "openai", "groq", "ollama")
    fn name(&self) -> &str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;

    /// Whether the service has the credentials it needs to be called
    fn is_configured(&self) -> bool {
        true
    }

    /// Send the transcript and tool catalog, returning final text or tool calls
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint cannot be reached, rejects the
    /// request or returns an unreadable response.
    async fn reason(
        &self,
        request: &ChatRequest,
        tools: &[FunctionDeclaration],
    ) -> AppResult<ReasoningReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_calling_capabilities() {
        let caps = LlmCapabilities::tool_calling();
        assert!(caps.supports_function_calling());
        assert!(caps.supports_system_messages());
        assert!(!LlmCapabilities::SYSTEM_MESSAGES.supports_function_calling());
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hello")])
            .with_temperature(0.2)
            .with_max_tokens(2048);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.messages[0].role.as_str(), "user");
    }
}
