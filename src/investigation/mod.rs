// ABOUTME: Investigation pipeline: mode classification, the bounded reasoning loop and follow-ups
// ABOUTME: Re-exports the orchestrator, classifier and follow-up extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Question investigation
//!
//! A [`Question`](haulsight_core::models::Question) is classified once by the
//! [`ModeClassifier`], then driven through the [`InvestigationOrchestrator`]
//! until the model answers or the mode's turn budget runs out. Follow-up
//! suggestions are extracted from the final answer.

/// Rule-based processing mode classifier
pub mod classifier;
/// Follow-up question extraction
pub mod followups;
/// Bounded multi-turn reasoning loop
pub mod orchestrator;

pub use classifier::ModeClassifier;
pub use followups::{extract_follow_ups, generic_follow_ups};
pub use orchestrator::{InvestigationOrchestrator, InvestigationState, InvestigationTrace};
