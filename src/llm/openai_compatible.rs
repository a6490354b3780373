// ABOUTME: OpenAI-compatible chat-completions client used as the reasoning service
// ABOUTME: Sends tool declarations, parses tool calls, maps HTTP errors and retries transient failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! Works with any endpoint implementing the `OpenAI` chat completions API:
//! api.openai.com, Groq, and local servers such as Ollama or vLLM.
//!
//! Rate-limited (429) and unavailable (502, 503) responses are retried with
//! exponential backoff up to `max_retries` times.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::{
    ChatMessage, ChatRequest, FunctionCall, FunctionDeclaration, LlmCapabilities, ReasoningReply,
    ReasoningService, TokenUsage,
};
use crate::config::{LlmConfig, LlmProviderType};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// First retry delay; doubles per attempt
const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on one backoff sleep
const MAX_BACKOFF_MS: u64 = 8_000;

/// Service name used in error messages
const SERVICE_LABEL: &str = "Reasoning service";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging
    pub provider_name: String,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
    /// Whether requests without an API key are accepted
    pub requires_api_key: bool,
    /// Request timeout
    pub timeout: Duration,
    /// Retries for 429/502/503 responses
    pub max_retries: u32,
}

impl std::fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("provider_name", &self.provider_name)
            .field("capabilities", &self.capabilities)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleConfig {
    fn preset(provider: LlmProviderType, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: provider.default_base_url().to_owned(),
            api_key,
            default_model: model.to_owned(),
            provider_name: provider.as_str().to_owned(),
            capabilities: LlmCapabilities::tool_calling(),
            requires_api_key: provider.requires_api_key(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Configuration for api.openai.com
    #[must_use]
    pub fn openai(model: &str, api_key: impl Into<String>) -> Self {
        Self::preset(LlmProviderType::OpenAi, model, Some(api_key.into()))
    }

    /// Configuration for Groq's OpenAI-compatible endpoint
    #[must_use]
    pub fn groq(model: &str, api_key: impl Into<String>) -> Self {
        Self::preset(LlmProviderType::Groq, model, Some(api_key.into()))
    }

    /// Configuration for a local Ollama instance
    #[must_use]
    pub fn ollama(model: &str) -> Self {
        let mut config = Self::preset(LlmProviderType::Local, model, None);
        config.provider_name = "ollama".to_owned();
        config
    }

    /// Configuration derived from environment settings
    #[must_use]
    pub fn from_llm_config(llm: &LlmConfig) -> Self {
        let mut config = Self::preset(llm.provider, &llm.model, llm.api_key.clone());
        config.base_url.clone_from(&llm.base_url);
        config.timeout = Duration::from_secs(llm.timeout_secs.max(1));
        config.max_retries = llm.max_retries;
        config
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible reasoning provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            provider = %config.provider_name,
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized reasoning provider"
        );
        Ok(Self { client, config })
    }

    /// Create a provider from environment-derived settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_llm_config(llm: &LlmConfig) -> AppResult<Self> {
        Self::new(OpenAiCompatibleConfig::from_llm_config(llm))
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn convert_tools(tools: &[FunctionDeclaration]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|func| OpenAiTool {
                tool_type: "function",
                function: OpenAiFunction {
                    name: func.name.clone(),
                    description: func.description.clone(),
                    parameters: func.parameters.clone(),
                },
            })
            .collect()
    }

    /// Convert tool calls, keeping unparseable arguments as a raw string
    fn convert_tool_calls(tool_calls: Vec<OpenAiToolCall>) -> Vec<FunctionCall> {
        tool_calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                let args = if call.function.arguments.trim().is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&call.function.arguments)
                        .unwrap_or(Value::String(call.function.arguments))
                };
                let id = if call.id.is_empty() {
                    format!("call_{}", index + 1)
                } else {
                    call.id
                };
                FunctionCall {
                    id,
                    name: call.function.name,
                    args,
                }
            })
            .collect()
    }

    /// Map a non-success response to an error code
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |parsed| parsed.error.message,
        );

        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{SERVICE_LABEL} rejected the credentials: {detail}"),
            ),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("{SERVICE_LABEL} rate limit reached: {detail}"),
            ),
            400 => AppError::invalid_input(format!("{SERVICE_LABEL} validation error: {detail}")),
            502..=504 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("{SERVICE_LABEL} unavailable ({status}): {detail}"),
            ),
            _ => AppError::external_service(
                SERVICE_LABEL,
                format!("API error ({status}): {detail}"),
            ),
        }
    }

    const fn is_retryable(status: StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 502 | 503)
    }

    fn backoff(attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
    }

    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    /// POST the request, retrying transient statuses, and return the success body
    async fn send_with_retry(&self, payload: &OpenAiRequest) -> AppResult<String> {
        let mut attempt = 0_u32;
        loop {
            let http_request = self
                .client
                .post(self.api_url("chat/completions"))
                .header("Content-Type", "application/json")
                .json(payload);

            let response = self.add_auth_header(http_request).send().await.map_err(|e| {
                error!(provider = %self.config.provider_name, error = %e, "Failed to send request");
                if e.is_timeout() {
                    AppError::timeout(SERVICE_LABEL, self.config.timeout.as_secs())
                } else if e.is_connect() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!("Cannot connect to {SERVICE_LABEL} at {}", self.config.base_url),
                    )
                } else {
                    AppError::external_service(SERVICE_LABEL, format!("Request failed: {e}"))
                }
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                AppError::external_service(SERVICE_LABEL, format!("Failed to read response: {e}"))
            })?;

            if status.is_success() {
                return Ok(body);
            }
            if Self::is_retryable(status) && attempt < self.config.max_retries {
                let delay = Self::backoff(attempt);
                warn!(
                    provider = %self.config.provider_name,
                    status = %status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transient reasoning service error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }
            return Err(Self::parse_error_response(status, &body));
        }
    }

    /// Perform a chat completion with tool calling
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response cannot be parsed.
    #[instrument(
        skip(self, request, tools),
        fields(provider = %self.config.provider_name, tools = tools.len())
    )]
    pub async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[FunctionDeclaration],
    ) -> AppResult<ReasoningReply> {
        if !self.is_configured() {
            return Err(AppError::config(format!(
                "No API key configured for the {} reasoning provider",
                self.config.provider_name
            )));
        }

        let model = &self.config.default_model;
        let payload = OpenAiRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
            tools: (!tools.is_empty()).then(|| Self::convert_tools(tools)),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };
        debug!(
            messages = payload.messages.len(),
            model = %model,
            "Sending chat completion request"
        );

        let body = self.send_with_retry(&payload).await?;
        let response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            let excerpt: String = body.chars().take(500).collect();
            error!(error = %e, body = %excerpt, "Failed to parse response");
            AppError::external_service(SERVICE_LABEL, format!("Failed to parse response: {e}"))
        })?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt,
            completion_tokens: u.completion,
            total_tokens: u.total,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_LABEL, "API returned no choices"))?;

        debug!(
            model = %response.model,
            finish_reason = ?choice.finish_reason,
            total_tokens = usage.map(|u| u.total_tokens),
            "Received chat completion"
        );

        let content = choice.message.content.filter(|c| !c.trim().is_empty());
        match choice.message.tool_calls.filter(|calls| !calls.is_empty()) {
            Some(calls) => Ok(ReasoningReply::ToolCalls {
                thinking: content,
                calls: Self::convert_tool_calls(calls),
            }),
            None => Ok(ReasoningReply::Final {
                content: content.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ReasoningService for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some() || !self.config.requires_api_key
    }

    async fn reason(
        &self,
        request: &ChatRequest,
        tools: &[FunctionDeclaration],
    ) -> AppResult<ReasoningReply> {
        self.complete_with_tools(request, tools).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let auth = OpenAiCompatibleProvider::parse_error_response(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"bad key"}}"#,
        );
        assert_eq!(auth.code, ErrorCode::ExternalAuthFailed);

        let limited =
            OpenAiCompatibleProvider::parse_error_response(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(limited.code, ErrorCode::ExternalRateLimited);

        let invalid = OpenAiCompatibleProvider::parse_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"max_tokens too large"}}"#,
        );
        assert_eq!(invalid.code, ErrorCode::InvalidInput);
        assert!(invalid.message.contains("max_tokens too large"));

        let down =
            OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(down.code, ErrorCode::ExternalServiceUnavailable);
    }

    #[test]
    fn test_retryable_statuses_and_backoff() {
        assert!(OpenAiCompatibleProvider::is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(OpenAiCompatibleProvider::is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!OpenAiCompatibleProvider::is_retryable(StatusCode::UNAUTHORIZED));
        assert_eq!(OpenAiCompatibleProvider::backoff(0), Duration::from_millis(500));
        assert_eq!(OpenAiCompatibleProvider::backoff(2), Duration::from_millis(2_000));
        assert_eq!(OpenAiCompatibleProvider::backoff(30), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_tool_call_conversion() {
        let calls = vec![
            OpenAiToolCall {
                id: "call_abc".to_owned(),
                function: OpenAiFunctionCall {
                    name: "analyze_metric".to_owned(),
                    arguments: r#"{"metric":"retail"}"#.to_owned(),
                },
            },
            OpenAiToolCall {
                id: String::new(),
                function: OpenAiFunctionCall {
                    name: "get_summary_stats".to_owned(),
                    arguments: "{not json".to_owned(),
                },
            },
        ];

        let converted = OpenAiCompatibleProvider::convert_tool_calls(calls);
        assert_eq!(converted[0].id, "call_abc");
        assert_eq!(converted[0].args["metric"], "retail");
        assert_eq!(converted[1].id, "call_2");
        assert_eq!(converted[1].args, Value::String("{not json".to_owned()));
    }

    #[test]
    fn test_missing_key_means_unconfigured() {
        let mut config = OpenAiCompatibleConfig::openai("gpt-4o-mini", "sk-test");
        config.api_key = None;
        let provider = OpenAiCompatibleProvider::new(config).unwrap();
        assert!(!provider.is_configured());

        let local =
            OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::ollama("qwen2.5")).unwrap();
        assert!(local.is_configured());
        assert_eq!(local.name(), "ollama");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = OpenAiCompatibleConfig::groq("llama-3.3-70b-versatile", "gsk-secret");
        assert!(!format!("{config:?}").contains("gsk-secret"));
    }
}
