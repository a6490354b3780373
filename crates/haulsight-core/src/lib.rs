// ABOUTME: Core types and constants for the Haulsight investigation service
// ABOUTME: Foundation crate with error handling, shared investigation models and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Haulsight Core
//!
//! Foundation crate providing shared types and constants for the Haulsight
//! shipment analytics service. This crate is designed to change infrequently,
//! enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ToolError`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Investigation request/response models, reasoning steps and visualizations

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core data models (questions, reasoning steps, visualizations, responses)
pub mod models;
