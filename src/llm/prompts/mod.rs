// ABOUTME: System prompt for the shipment investigator loaded at compile time
// ABOUTME: Appends the per-mode guidance and turn budget to the static instructions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! The base prompt lives in a markdown file for easy maintenance and is loaded
//! at compile time. [`investigator_system_prompt`] adds the mode-specific
//! guidance for one investigation.

use haulsight_core::models::ProcessingMode;

/// Haulsight investigator system prompt
///
/// Contains the role, the tool catalog in prose, error-recovery guidance and
/// the answer format (including the follow-up questions section).
pub const INVESTIGATOR_SYSTEM_PROMPT: &str = include_str!("investigator_system.md");

const fn mode_guidance(mode: ProcessingMode) -> &'static str {
    match mode {
        ProcessingMode::Quick => {
            "This is a quick question. Use at most one or two tool calls and answer in a few sentences."
        }
        ProcessingMode::Visual => {
            "The person wants to see the data. Prefer tools that return breakdowns, trends or comparisons; charts are built from their results automatically."
        }
        ProcessingMode::Deep => {
            "This question needs investigation. Check the overall picture, then drill into the groups or periods that explain it before answering."
        }
    }
}

/// Full system prompt for one investigation
#[must_use]
pub fn investigator_system_prompt(mode: ProcessingMode, max_turns: usize) -> String {
    format!(
        "{INVESTIGATOR_SYSTEM_PROMPT}\n## This investigation\n\nMode: {mode}. {}\nYou have at most {max_turns} rounds of tool calls before you must answer.\n",
        mode_guidance(mode)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_every_tool() {
        for tool in [
            "get_field_info",
            "analyze_metric",
            "get_trend",
            "compare_periods",
            "detect_anomalies",
            "get_summary_stats",
        ] {
            assert!(INVESTIGATOR_SYSTEM_PROMPT.contains(tool), "missing {tool}");
        }
    }

    #[test]
    fn test_mode_section_includes_budget() {
        let prompt = investigator_system_prompt(ProcessingMode::Quick, 3);
        assert!(prompt.contains("Mode: quick."));
        assert!(prompt.contains("at most 3 rounds"));
    }
}
