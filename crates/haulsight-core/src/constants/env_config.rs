// ABOUTME: Environment variable names consumed by the configuration layer
// ABOUTME: Centralized so config loading and docs agree on spelling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// HTTP listen port
pub const HTTP_PORT: &str = "HTTP_PORT";
/// sqlx connection string for the shipment store
pub const DATABASE_URL: &str = "DATABASE_URL";
/// Deployment environment (development, production, testing)
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Comma-separated origins allowed by CORS, or `*`
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
/// Whole-request timeout for the investigate endpoint in seconds
pub const REQUEST_TIMEOUT_SECS: &str = "HAULSIGHT_REQUEST_TIMEOUT_SECS";

/// Reasoning provider selector (openai, groq, local)
pub const LLM_PROVIDER: &str = "HAULSIGHT_LLM_PROVIDER";
/// Base URL of an OpenAI-compatible endpoint
pub const LLM_BASE_URL: &str = "HAULSIGHT_LLM_BASE_URL";
/// Model name sent with each request
pub const LLM_MODEL: &str = "HAULSIGHT_LLM_MODEL";
/// API key for the provider
pub const LLM_API_KEY: &str = "HAULSIGHT_LLM_API_KEY";
/// Per-request timeout in seconds
pub const LLM_TIMEOUT_SECS: &str = "HAULSIGHT_LLM_TIMEOUT_SECS";
/// Retries for throttled or unavailable responses
pub const LLM_MAX_RETRIES: &str = "HAULSIGHT_LLM_MAX_RETRIES";
/// Fallback API key when the provider is `openai`
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Fallback API key when the provider is `groq`
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

/// Timeout for one reasoning turn in seconds
pub const REASONING_TIMEOUT_SECS: &str = "HAULSIGHT_REASONING_TIMEOUT_SECS";
/// Turn budget override for quick mode
pub const MAX_TURNS_QUICK: &str = "HAULSIGHT_MAX_TURNS_QUICK";
/// Turn budget override for visual mode
pub const MAX_TURNS_VISUAL: &str = "HAULSIGHT_MAX_TURNS_VISUAL";
/// Turn budget override for deep mode
pub const MAX_TURNS_DEEP: &str = "HAULSIGHT_MAX_TURNS_DEEP";
