// ABOUTME: Tool-specific error types returned to the reasoning service as structured results
// ABOUTME: Covers unknown tools, unknown fields, bad arguments and failed executions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Error Types
//!
//! Errors raised while validating or executing a tool call. None of these are
//! fatal to an investigation: they are serialized into the transcript so the
//! model can correct itself on the next turn.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors specific to tool operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    /// The model requested a tool outside the catalog
    UnknownTool {
        /// Name of the requested tool
        tool_name: String,
    },
    /// A field name argument is not in the schema registry
    UnknownField {
        /// Name of the tool
        tool_name: String,
        /// The unknown field name
        field: String,
        /// Close matches from the registry
        suggestions: Vec<String>,
    },
    /// Tool parameter validation failed
    InvalidParameter {
        /// Name of the tool
        tool_name: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Reason the parameter is invalid
        reason: String,
    },
    /// Required parameter is missing
    MissingParameter {
        /// Name of the tool
        tool_name: String,
        /// Name of the missing parameter
        parameter: String,
    },
    /// Tool execution failed
    ExecutionFailed {
        /// Name of the tool that failed
        tool_name: String,
        /// Details about the failure
        details: String,
    },
    /// Investigation was cancelled before the tool ran
    Cancelled {
        /// Name of the tool that was skipped
        tool_name: String,
    },
}

impl ToolError {
    /// Create an "unknown tool" error
    #[must_use]
    pub fn unknown_tool(tool_name: impl Into<String>) -> Self {
        Self::UnknownTool {
            tool_name: tool_name.into(),
        }
    }

    /// Create an "unknown field" error
    #[must_use]
    pub fn unknown_field(
        tool_name: impl Into<String>,
        field: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UnknownField {
            tool_name: tool_name.into(),
            field: field.into(),
            suggestions,
        }
    }

    /// Create an "invalid parameter" error
    #[must_use]
    pub fn invalid_parameter(
        tool_name: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            tool_name: tool_name.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a "missing parameter" error
    #[must_use]
    pub fn missing_parameter(tool_name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            tool_name: tool_name.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an "execution failed" error
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            details: details.into(),
        }
    }

    /// Create a "cancelled" error
    #[must_use]
    pub fn cancelled(tool_name: impl Into<String>) -> Self {
        Self::Cancelled {
            tool_name: tool_name.into(),
        }
    }

    /// Get the tool name associated with this error
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::UnknownTool { tool_name }
            | Self::UnknownField { tool_name, .. }
            | Self::InvalidParameter { tool_name, .. }
            | Self::MissingParameter { tool_name, .. }
            | Self::ExecutionFailed { tool_name, .. }
            | Self::Cancelled { tool_name } => tool_name,
        }
    }

    /// Whether the model can fix this by changing its arguments
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool { .. }
                | Self::UnknownField { .. }
                | Self::InvalidParameter { .. }
                | Self::MissingParameter { .. }
        )
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { tool_name } => {
                write!(f, "Tool '{tool_name}' not found")
            }
            Self::UnknownField {
                tool_name,
                field,
                suggestions,
            } => {
                write!(f, "Unknown field '{field}' for tool '{tool_name}'")?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean: {}?)", suggestions.join(", "))?;
                }
                Ok(())
            }
            Self::InvalidParameter {
                tool_name,
                parameter,
                reason,
            } => {
                write!(
                    f,
                    "Invalid parameter '{parameter}' for tool '{tool_name}': {reason}"
                )
            }
            Self::MissingParameter {
                tool_name,
                parameter,
            } => {
                write!(
                    f,
                    "Missing required parameter '{parameter}' for tool '{tool_name}'"
                )
            }
            Self::ExecutionFailed { tool_name, details } => {
                write!(f, "Tool '{tool_name}' execution failed: {details}")
            }
            Self::Cancelled { tool_name } => {
                write!(f, "Tool '{tool_name}' skipped: investigation cancelled")
            }
        }
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display_lists_suggestions() {
        let error = ToolError::unknown_field(
            "analyze_metric",
            "carrier",
            vec!["carrier_name".to_owned()],
        );

        assert_eq!(error.tool_name(), "analyze_metric");
        assert!(error.is_argument_error());
        assert_eq!(
            error.to_string(),
            "Unknown field 'carrier' for tool 'analyze_metric' (did you mean: carrier_name?)"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let error = ToolError::missing_parameter("get_trend", "period");
        let json = serde_json::to_value(error).unwrap();
        assert_eq!(json["kind"], "missing_parameter");
        assert_eq!(json["parameter"], "period");
    }
}
