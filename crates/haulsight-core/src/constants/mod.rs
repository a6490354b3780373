// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for endpoints, budgets, classification and query limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large list.

/// Environment variable names read by the configuration layer
pub mod env_config;

/// Service identity
pub mod service {
    /// Service name used in logs and health responses
    pub const SERVICE_NAME: &str = "haulsight";
    /// Crate version baked in at build time
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Investigation endpoint
    pub const INVESTIGATE: &str = "/api/investigate";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Turn and response-size budgets per processing mode.
///
/// Both budgets strictly increase quick < visual < deep.
pub mod budgets {
    /// Reasoning turns allowed in quick mode
    pub const QUICK_MAX_TURNS: usize = 3;
    /// Reasoning turns allowed in visual mode
    pub const VISUAL_MAX_TURNS: usize = 5;
    /// Reasoning turns allowed in deep mode
    pub const DEEP_MAX_TURNS: usize = 8;

    /// Response tokens requested in quick mode
    pub const QUICK_MAX_TOKENS: u32 = 1024;
    /// Response tokens requested in visual mode
    pub const VISUAL_MAX_TOKENS: u32 = 2048;
    /// Response tokens requested in deep mode
    pub const DEEP_MAX_TOKENS: u32 = 4096;

    /// Upper bound on any configured turn budget
    pub const MAX_TURNS_CEILING: usize = 20;
}

/// Mode classifier thresholds and confidences
pub mod classification {
    /// Confidence reported when the quick family matches
    pub const QUICK_CONFIDENCE: f64 = 0.9;
    /// Confidence reported when the visual family matches
    pub const VISUAL_CONFIDENCE: f64 = 0.85;
    /// Confidence reported when the deep family matches
    pub const DEEP_CONFIDENCE: f64 = 0.8;
    /// Confidence for the unmatched default on long questions
    pub const LONG_DEFAULT_CONFIDENCE: f64 = 0.6;
    /// Confidence for the unmatched default on short questions
    pub const SHORT_DEFAULT_CONFIDENCE: f64 = 0.5;
    /// Confidence reported when the caller forces a mode
    pub const FORCED_CONFIDENCE: f64 = 1.0;
    /// Character count above which an unmatched question counts as long
    pub const LONG_QUESTION_THRESHOLD: usize = 100;
    /// Longest question the quick family accepts
    pub const QUICK_MAX_CHARS: usize = 120;
}

/// Query engine defaults and limits
pub mod query {
    /// Default number of groups returned by categorical analysis
    pub const DEFAULT_GROUP_LIMIT: usize = 15;
    /// Hard cap on groups returned by categorical analysis
    pub const MAX_GROUP_LIMIT: usize = 50;
    /// Minimum number of groups an anomaly scan needs
    pub const MIN_ANOMALY_GROUPS: usize = 3;
    /// Sigma multiplier for high sensitivity
    pub const HIGH_SENSITIVITY_SIGMA: f64 = 1.5;
    /// Sigma multiplier for medium sensitivity
    pub const MEDIUM_SENSITIVITY_SIGMA: f64 = 2.0;
    /// Sigma multiplier for low sensitivity
    pub const LOW_SENSITIVITY_SIGMA: f64 = 3.0;
    /// Default lookback for analyses without an explicit time range
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
    /// Default lookback for summary statistics
    pub const SUMMARY_LOOKBACK_DAYS: i64 = 30;
    /// Default lookback for daily trends
    pub const DAILY_TREND_LOOKBACK_DAYS: i64 = 30;
    /// Default lookback for weekly trends
    pub const WEEKLY_TREND_LOOKBACK_DAYS: i64 = 84;
    /// Default lookback for monthly trends
    pub const MONTHLY_TREND_LOOKBACK_DAYS: i64 = 365;
    /// Longest lookback any relative window may span
    pub const MAX_LOOKBACK_DAYS: i64 = 730;
    /// Calendar-month form of [`MAX_LOOKBACK_DAYS`]; 24 months cover 731 days across a leap day
    pub const MAX_LOOKBACK_MONTHS: u32 = 24;
    /// Most shipment rows a single query may load before it is rejected as too broad
    pub const MAX_FETCH_ROWS: usize = 250_000;
    /// Top values reported per key dimension in summary statistics
    pub const SUMMARY_TOP_VALUES: usize = 5;
    /// Suggestions offered for an unknown field
    pub const MAX_FIELD_SUGGESTIONS: usize = 3;
    /// Minimum Jaro-Winkler similarity for a field suggestion
    pub const FIELD_SUGGESTION_THRESHOLD: f64 = 0.75;
}

/// Caller-facing answer text and follow-up defaults
pub mod answers {
    /// Answer returned when the reasoning service fails
    pub const FALLBACK_ANSWER: &str =
        "I wasn't able to complete this analysis right now. Please try again in a moment.";
    /// Answer returned when the request is rejected before any work starts
    pub const INVALID_REQUEST_ANSWER: &str =
        "Please include both a question and a customer before starting an investigation.";
    /// Answer returned when the investigation is cancelled with nothing gathered
    pub const CANCELLED_ANSWER: &str =
        "The investigation was cancelled before an answer was ready.";
    /// Answer prefix when the turn budget runs out
    pub const EXHAUSTED_PREFIX: &str =
        "I reached the limit of investigation steps for this question. Here is what I found so far:";
    /// Answer when the turn budget runs out with no findings at all
    pub const EXHAUSTED_EMPTY_ANSWER: &str =
        "I reached the limit of investigation steps before finding anything conclusive. Try narrowing the question to a carrier, lane or time period.";
    /// Maximum follow-up questions returned
    pub const MAX_FOLLOW_UPS: usize = 3;
    /// Shortest line accepted as a follow-up question
    pub const MIN_FOLLOW_UP_CHARS: usize = 10;
    /// Follow-ups offered when the answer suggests none
    pub const GENERIC_FOLLOW_UPS: [&str; 3] = [
        "How has this changed compared to the previous period?",
        "Which carriers contribute most to this result?",
        "Are there any unusual patterns I should look into?",
    ];
}
