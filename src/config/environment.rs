// ABOUTME: Environment configuration for the investigation server
// ABOUTME: Parses ports, database URL, reasoning provider settings and per-mode investigation budgets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration. There are no config files: every
//! setting has a default and may be overridden by one environment variable.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use haulsight_core::constants::budgets::{
    DEEP_MAX_TOKENS, DEEP_MAX_TURNS, MAX_TURNS_CEILING, QUICK_MAX_TOKENS, QUICK_MAX_TURNS,
    VISUAL_MAX_TOKENS, VISUAL_MAX_TURNS,
};
use haulsight_core::constants::env_config;
use haulsight_core::constants::ports::DEFAULT_HTTP_PORT;
use haulsight_core::models::ProcessingMode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/haulsight.db";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LLM_MAX_RETRIES: u32 = 2;
const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 90;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

// ============================================================================
// Reasoning Provider
// ============================================================================

/// Which OpenAI-compatible endpoint family the reasoning service talks to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// api.openai.com
    OpenAi,
    /// Groq's OpenAI-compatible endpoint
    Groq,
    /// Local server such as Ollama or vLLM
    #[default]
    Local,
}

impl LlmProviderType {
    /// Parse from string with fallback to `Local`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            "groq" => Self::Groq,
            _ => Self::Local,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Local => "local",
        }
    }

    /// Base URL used when none is configured
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Local => "http://localhost:11434/v1",
        }
    }

    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Local => "qwen2.5:14b-instruct",
        }
    }

    /// Vendor-specific API key variable consulted after `HAULSIGHT_LLM_API_KEY`
    #[must_use]
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some(env_config::OPENAI_API_KEY),
            Self::Groq => Some(env_config::GROQ_API_KEY),
            Self::Local => None,
        }
    }

    /// Whether the endpoint rejects unauthenticated requests
    #[must_use]
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasoning service connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Endpoint family
    pub provider: LlmProviderType,
    /// Base URL ending in `/v1`
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Bearer token, absent for local servers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for rate-limited or unavailable responses
    pub max_retries: u32,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = LlmProviderType::default();
        Self {
            provider,
            base_url: provider.default_base_url().to_owned(),
            model: provider.default_model().to_owned(),
            api_key: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_retries: DEFAULT_LLM_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Load reasoning provider settings from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric setting cannot be parsed
    pub fn from_env() -> Result<Self> {
        let provider = LlmProviderType::from_str_or_default(&env_var_or(
            env_config::LLM_PROVIDER,
            LlmProviderType::default().as_str(),
        ));
        let api_key = env::var(env_config::LLM_API_KEY)
            .ok()
            .or_else(|| provider.api_key_env().and_then(|key| env::var(key).ok()))
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            provider,
            base_url: env_var_or(env_config::LLM_BASE_URL, provider.default_base_url()),
            model: env_var_or(env_config::LLM_MODEL, provider.default_model()),
            api_key,
            timeout_secs: env_var_or(
                env_config::LLM_TIMEOUT_SECS,
                &DEFAULT_LLM_TIMEOUT_SECS.to_string(),
            )
            .parse()
            .context("Invalid HAULSIGHT_LLM_TIMEOUT_SECS value")?,
            max_retries: env_var_or(
                env_config::LLM_MAX_RETRIES,
                &DEFAULT_LLM_MAX_RETRIES.to_string(),
            )
            .parse()
            .context("Invalid HAULSIGHT_LLM_MAX_RETRIES value")?,
        })
    }

    /// Whether the provider can be called with these settings
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.api_key.is_some() || !self.provider.requires_api_key()
    }
}

// ============================================================================
// Investigation Budgets
// ============================================================================

/// Turn and response-size budget for one processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeBudget {
    /// Maximum reasoning turns
    pub max_turns: usize,
    /// Maximum tokens per reasoning reply
    pub max_tokens: u32,
}

/// Budgets for all modes, strictly increasing quick → visual → deep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeBudgets {
    quick: ModeBudget,
    visual: ModeBudget,
    deep: ModeBudget,
}

impl Default for ModeBudgets {
    fn default() -> Self {
        Self {
            quick: ModeBudget {
                max_turns: QUICK_MAX_TURNS,
                max_tokens: QUICK_MAX_TOKENS,
            },
            visual: ModeBudget {
                max_turns: VISUAL_MAX_TURNS,
                max_tokens: VISUAL_MAX_TOKENS,
            },
            deep: ModeBudget {
                max_turns: DEEP_MAX_TURNS,
                max_tokens: DEEP_MAX_TOKENS,
            },
        }
    }
}

impl ModeBudgets {
    /// Override turn limits, clamped so the ordering stays strict and within the ceiling
    #[must_use]
    pub fn with_max_turns(mut self, quick: usize, visual: usize, deep: usize) -> Self {
        let quick = quick.clamp(1, MAX_TURNS_CEILING - 2);
        let visual = visual.clamp(quick + 1, MAX_TURNS_CEILING - 1);
        let deep = deep.clamp(visual + 1, MAX_TURNS_CEILING);
        self.quick.max_turns = quick;
        self.visual.max_turns = visual;
        self.deep.max_turns = deep;
        self
    }

    /// Budget for a mode
    #[must_use]
    pub const fn for_mode(&self, mode: ProcessingMode) -> ModeBudget {
        match mode {
            ProcessingMode::Quick => self.quick,
            ProcessingMode::Visual => self.visual,
            ProcessingMode::Deep => self.deep,
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvestigationConfig {
    /// Upper bound on one reasoning-service call
    pub reasoning_timeout: Duration,
    /// Wall-clock budget for a whole investigation; spending it ends the
    /// loop as exhausted with whatever was gathered
    pub time_budget: Option<Duration>,
    /// Per-mode budgets
    pub budgets: ModeBudgets,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            reasoning_timeout: Duration::from_secs(DEFAULT_REASONING_TIMEOUT_SECS),
            time_budget: None,
            budgets: ModeBudgets::default(),
        }
    }
}

impl InvestigationConfig {
    /// Load orchestrator settings from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric setting cannot be parsed
    pub fn from_env() -> Result<Self> {
        let defaults = ModeBudgets::default();
        let turns = |key: &str, mode: ProcessingMode| -> Result<usize> {
            env_var_or(key, &defaults.for_mode(mode).max_turns.to_string())
                .parse()
                .with_context(|| format!("Invalid {key} value"))
        };
        let quick = turns(env_config::MAX_TURNS_QUICK, ProcessingMode::Quick)?;
        let visual = turns(env_config::MAX_TURNS_VISUAL, ProcessingMode::Visual)?;
        let deep = turns(env_config::MAX_TURNS_DEEP, ProcessingMode::Deep)?;
        let budgets = defaults.with_max_turns(quick, visual, deep);
        if budgets.for_mode(ProcessingMode::Quick).max_turns != quick
            || budgets.for_mode(ProcessingMode::Visual).max_turns != visual
            || budgets.for_mode(ProcessingMode::Deep).max_turns != deep
        {
            warn!(quick, visual, deep, "Turn limits adjusted to keep quick < visual < deep");
        }

        let timeout_secs: u64 = env_var_or(
            env_config::REASONING_TIMEOUT_SECS,
            &DEFAULT_REASONING_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .context("Invalid HAULSIGHT_REASONING_TIMEOUT_SECS value")?;

        Ok(Self {
            reasoning_timeout: Duration::from_secs(timeout_secs.max(1)),
            time_budget: None,
            budgets,
        })
    }
}

// ============================================================================
// HTTP Configuration
// ============================================================================

/// CORS (Cross-Origin Resource Sharing) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins; empty or `*` allows any
    pub allowed_origins: String,
}

impl CorsConfig {
    /// Load CORS configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            allowed_origins: env_var_or(env_config::CORS_ALLOWED_ORIGINS, "*"),
        }
    }

    /// Whether any origin is accepted
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        let origins = self.allowed_origins.trim();
        origins.is_empty() || origins == "*"
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// sqlx database URL
    pub database_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Reasoning service settings
    pub llm: LlmConfig,
    /// Orchestrator settings
    pub investigation: InvestigationConfig,
    /// Cross-origin policy for browser clients
    pub cors: CorsConfig,
    /// Whole-request timeout for `POST /api/investigate`; also the
    /// investigation time budget
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let request_timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        Self {
            http_port: DEFAULT_HTTP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            environment: Environment::default(),
            llm: LlmConfig::default(),
            investigation: InvestigationConfig {
                time_budget: Some(request_timeout),
                ..InvestigationConfig::default()
            },
            cors: CorsConfig {
                allowed_origins: "*".to_owned(),
            },
            request_timeout,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if any numeric setting cannot be parsed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let request_timeout = Duration::from_secs(
            env_var_or(
                env_config::REQUEST_TIMEOUT_SECS,
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .context("Invalid HAULSIGHT_REQUEST_TIMEOUT_SECS value")?
            .max(1),
        );
        let config = Self {
            http_port: env_var_or(env_config::HTTP_PORT, &DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database_url: env_var_or(env_config::DATABASE_URL, DEFAULT_DATABASE_URL),
            environment: Environment::from_str_or_default(&env_var_or(
                env_config::ENVIRONMENT,
                "development",
            )),
            llm: LlmConfig::from_env()?,
            investigation: InvestigationConfig {
                time_budget: Some(request_timeout),
                ..InvestigationConfig::from_env()?
            },
            cors: CorsConfig::from_env(),
            request_timeout,
        };

        if !config.llm.has_credentials() {
            warn!(
                provider = %config.llm.provider,
                "No API key configured for the reasoning provider; investigations will return fallback answers"
            );
        }

        Ok(config)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        let budgets = &self.investigation.budgets;
        format!(
            "Haulsight Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Reasoning Provider: {} ({}, model {})\n\
             - API Key: {}\n\
             - Reasoning Timeout: {}s\n\
             - Request Timeout: {}s\n\
             - CORS Origins: {}\n\
             - Turn Budgets: quick {} / visual {} / deep {}",
            self.http_port,
            self.environment,
            if self.database_url.starts_with("sqlite") {
                "SQLite"
            } else {
                "Other"
            },
            self.llm.provider,
            self.llm.base_url,
            self.llm.model,
            if self.llm.api_key.is_some() {
                "Configured"
            } else {
                "Not configured"
            },
            self.investigation.reasoning_timeout.as_secs(),
            self.request_timeout.as_secs(),
            if self.cors.allows_any_origin() {
                "*"
            } else {
                self.cors.allowed_origins.as_str()
            },
            budgets.for_mode(ProcessingMode::Quick).max_turns,
            budgets.for_mode(ProcessingMode::Visual).max_turns,
            budgets.for_mode(ProcessingMode::Deep).max_turns,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets_strictly_increase() {
        let budgets = ModeBudgets::default();
        let quick = budgets.for_mode(ProcessingMode::Quick);
        let visual = budgets.for_mode(ProcessingMode::Visual);
        let deep = budgets.for_mode(ProcessingMode::Deep);
        assert!(quick.max_turns < visual.max_turns && visual.max_turns < deep.max_turns);
        assert!(quick.max_tokens < visual.max_tokens && visual.max_tokens < deep.max_tokens);
        assert_eq!((quick.max_turns, visual.max_turns, deep.max_turns), (3, 5, 8));
    }

    #[test]
    fn test_max_turn_overrides_keep_order() {
        let budgets = ModeBudgets::default().with_max_turns(6, 4, 2);
        assert_eq!(budgets.for_mode(ProcessingMode::Quick).max_turns, 6);
        assert_eq!(budgets.for_mode(ProcessingMode::Visual).max_turns, 7);
        assert_eq!(budgets.for_mode(ProcessingMode::Deep).max_turns, 8);

        let budgets = ModeBudgets::default().with_max_turns(0, 100, 100);
        assert_eq!(budgets.for_mode(ProcessingMode::Quick).max_turns, 1);
        assert_eq!(budgets.for_mode(ProcessingMode::Deep).max_turns, MAX_TURNS_CEILING);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(LlmProviderType::from_str_or_default("OpenAI"), LlmProviderType::OpenAi);
        assert_eq!(LlmProviderType::from_str_or_default("groq"), LlmProviderType::Groq);
        assert_eq!(LlmProviderType::from_str_or_default("ollama"), LlmProviderType::Local);
        assert!(!LlmProviderType::Local.requires_api_key());
    }

    #[test]
    fn test_cors_wildcard_detection() {
        let any = CorsConfig {
            allowed_origins: " * ".to_owned(),
        };
        assert!(any.allows_any_origin());
        let listed = CorsConfig {
            allowed_origins: "https://ops.example.com".to_owned(),
        };
        assert!(!listed.allows_any_origin());
        assert!(ServerConfig::default().cors.allows_any_origin());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str_or_default("PROD"), Environment::Production);
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(Environment::from_str_or_default("whatever"), Environment::Development);
    }

    #[test]
    fn test_llm_config_debug_redacts_key() {
        let config = LlmConfig {
            provider: LlmProviderType::OpenAi,
            base_url: LlmProviderType::OpenAi.default_base_url().to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key: Some("sk-secret".to_owned()),
            timeout_secs: 60,
            max_retries: 2,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(config.has_credentials());
    }
}
