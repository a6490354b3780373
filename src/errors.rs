// ABOUTME: Error surface of the server crate, re-exported from haulsight-core
// ABOUTME: Keeps `crate::errors::AppError` paths stable for routes, tools and binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! The error types live in `haulsight-core` so the analytics crate can share
//! them. `AppError` implements axum's `IntoResponse` through the core crate's
//! `http-response` feature.

pub use haulsight_core::errors::{
    AppError, AppResult, ErrorCode, ErrorContext, ErrorResponse, ErrorResponseDetails, ToolError,
};
