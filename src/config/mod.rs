// ABOUTME: Configuration management module for server settings
// ABOUTME: Re-exports the environment-driven server, reasoning provider and investigation configs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the Haulsight server
//!
//! - **Environment**: server, database and reasoning provider settings
//! - **Budgets**: per-mode turn and response-size limits for investigations

/// Environment and server configuration
pub mod environment;

pub use environment::{
    CorsConfig, Environment, InvestigationConfig, LlmConfig, LlmProviderType, ModeBudget,
    ModeBudgets, ServerConfig,
};
