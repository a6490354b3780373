// ABOUTME: Shared test helpers for route and orchestrator integration tests
// ABOUTME: Exports the router request helper and the scripted reasoning service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
pub mod scripted_reasoning;
