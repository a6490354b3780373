// ABOUTME: Rule-based processing mode classifier run once before the first reasoning turn
// ABOUTME: Ordered quick, visual and deep pattern families with fixed confidences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Mode Classifier
//!
//! Families are tried in order: quick, visual, deep. The first family that
//! matches wins with its fixed confidence. Unmatched questions default to deep
//! with a lower confidence that depends on their length.
//!
//! The quick family only accepts short questions that open like a factual
//! lookup ("how many", "what was", "total") and carry no chart or causal
//! vocabulary, so "what is driving cost up?" is not answered in quick mode.

use std::sync::LazyLock;

use haulsight_core::constants::classification::{
    DEEP_CONFIDENCE, FORCED_CONFIDENCE, LONG_DEFAULT_CONFIDENCE, LONG_QUESTION_THRESHOLD,
    QUICK_CONFIDENCE, QUICK_MAX_CHARS, SHORT_DEFAULT_CONFIDENCE, VISUAL_CONFIDENCE,
};
use haulsight_core::models::{Classification, ProcessingMode};
use regex::Regex;

/// Factual openers for the quick family
static QUICK_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(how many|how much|what is|what's|what was|what were|what are|which|who|when|total|count|number of|list|give me the (total|number|count))\b",
    )
    .ok()
});

/// Explicit chart, breakdown and comparison requests
static VISUAL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(chart|graph|plot|visuali[sz]e|visuali[sz]ation|breakdown|break down|broken down|compare|comparison|versus|vs\.?|distribution|trend|trends|over time|month over month|week over week|split by|by (carrier|mode|lane|state|origin|destination|month|week|day))\b",
    )
    .ok()
});

/// Explanatory, investigative and anomaly language
static DEEP_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(why|explain|investigate|investigation|anomal\w*|root cause|what caused|causing|driv(e|es|ing|er|ers)|unusual|outliers?|spike[sd]?|dropp?(ed|ing)?|underperform\w*|diagnos\w*)\b",
    )
    .ok()
});

fn matches(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Deterministic question classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeClassifier;

impl ModeClassifier {
    /// Classify a question; a forced mode always wins
    #[must_use]
    pub fn classify(text: &str, forced: Option<ProcessingMode>) -> Classification {
        if let Some(mode) = forced {
            return Classification {
                detected: mode,
                confidence: FORCED_CONFIDENCE,
                reason: "forced by caller".to_owned(),
            };
        }

        let text = text.trim();
        let length = text.chars().count();
        let visual = matches(&VISUAL_PATTERN, text);
        let deep = matches(&DEEP_PATTERN, text);

        if length <= QUICK_MAX_CHARS && matches(&QUICK_PATTERN, text) && !visual && !deep {
            return Classification {
                detected: ProcessingMode::Quick,
                confidence: QUICK_CONFIDENCE,
                reason: "short factual question".to_owned(),
            };
        }
        if visual {
            return Classification {
                detected: ProcessingMode::Visual,
                confidence: VISUAL_CONFIDENCE,
                reason: "asks for a chart, breakdown or comparison".to_owned(),
            };
        }
        if deep {
            return Classification {
                detected: ProcessingMode::Deep,
                confidence: DEEP_CONFIDENCE,
                reason: "asks for an explanation or investigation".to_owned(),
            };
        }

        if length > LONG_QUESTION_THRESHOLD {
            Classification {
                detected: ProcessingMode::Deep,
                confidence: LONG_DEFAULT_CONFIDENCE,
                reason: "no pattern matched; long question defaults to deep".to_owned(),
            }
        } else {
            Classification {
                detected: ProcessingMode::Deep,
                confidence: SHORT_DEFAULT_CONFIDENCE,
                reason: "no pattern matched; defaulting to deep".to_owned(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(QUICK_PATTERN.is_some());
        assert!(VISUAL_PATTERN.is_some());
        assert!(DEEP_PATTERN.is_some());
    }

    #[test]
    fn test_quick_excludes_causal_questions() {
        let result = ModeClassifier::classify("What is driving our cost increase?", None);
        assert_eq!(result.detected, ProcessingMode::Deep);
        assert!((result.confidence - DEEP_CONFIDENCE).abs() < f64::EPSILON);
    }
}
