// ABOUTME: Main library entry point for the Haulsight shipment investigation server
// ABOUTME: Answers natural-language logistics questions with tool-calling reasoning and charts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # Haulsight Server
//!
//! Haulsight turns a question such as *"Which carriers got more expensive
//! per mile last quarter?"* into an answer, the reasoning steps that led to
//! it, suggested follow-up questions and chart descriptors.
//!
//! ## Architecture
//!
//! - **Investigation**: classifies the question into a processing mode and
//!   drives a bounded loop of reasoning turns
//! - **LLM**: OpenAI-compatible reasoning service that answers or requests tools
//! - **Tools**: six analytics tools validated against the schema registry and
//!   executed by the query engine from `haulsight-analytics`
//! - **Visualization**: maps each tool result to at most one chart
//! - **Database**: tenant-scoped `SQLite` shipment store
//! - **Routes**: `POST /api/investigate` and `GET /health`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use haulsight_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Haulsight configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// `SQLite` shipment store and demo data seeding
pub mod database;

/// Error types shared with `haulsight-core`
pub mod errors;

/// Mode classification, follow-up extraction and the investigation loop
pub mod investigation;

/// Reasoning service abstraction and the OpenAI-compatible client
pub mod llm;

/// Structured logging setup and helpers
pub mod logging;

/// Shared state handed to HTTP handlers
pub mod resources;

/// HTTP routes
pub mod routes;

/// Analytics tool catalog, argument validation and execution
pub mod tools;

/// Chart synthesis from tool results
pub mod visualization;
