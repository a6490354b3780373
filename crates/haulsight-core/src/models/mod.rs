// ABOUTME: Shared data models for investigations
// ABOUTME: Re-exports question, response, reasoning and visualization types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Core data models shared by the analytics crate and the server.

/// Inbound request, validated question, reasoning steps and outbound response
pub mod investigation;

/// Chart-ready visualization descriptors
pub mod visualization;

pub use investigation::{
    Classification, ConversationTurn, FollowUpQuestion, InvestigationRequest,
    InvestigationResponse, Outcome, Preferences, ProcessingMode, Question, ReasoningStep,
    ResponseMetadata, TurnRole,
};
pub use visualization::{
    ChartData, ChartKind, DataPoint, Direction, StatComparison, ValueFormat, Visualization,
};
