// ABOUTME: Typed tool arguments and their validation into query engine requests
// ABOUTME: Raw JSON from the reasoning service becomes a ToolInvocation or a structured ToolError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Invocations
//!
//! Arguments arrive as loosely typed JSON. Each tool has an argument struct
//! deserialized with serde; enumerated values (aggregation, period,
//! sensitivity) are parsed afterwards so the error names the offending
//! parameter. Field names are checked by the query engine against the schema
//! registry.

use haulsight_analytics::{
    Aggregation, AnalysisRequest, AnomalyRequest, ComparisonRequest, Sensitivity, TrendPeriod,
    TrendRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::catalog::ToolId;
use crate::errors::ToolError;

/// Arguments of `get_field_info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldInfoArgs {
    /// Field, derived metric or category; `None` lists everything
    #[serde(default)]
    pub field_name: Option<String>,
}

/// Arguments of `analyze_metric`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeMetricArgs {
    /// Metric field
    pub metric: String,
    /// Aggregation name
    pub aggregation: String,
    /// Grouping field
    pub group_by: String,
    /// Derived ratio metric
    #[serde(default)]
    pub derived_metric: Option<String>,
    /// Maximum groups
    #[serde(default)]
    pub limit: Option<i64>,
    /// Range expression
    #[serde(default)]
    pub time_range: Option<String>,
}

/// Arguments of `get_trend`
#[derive(Debug, Clone, Deserialize)]
pub struct TrendArgs {
    /// Metric field
    pub metric: String,
    /// Aggregation name
    pub aggregation: String,
    /// `day`, `week` or `month`
    pub period: String,
    /// Range expression
    #[serde(default)]
    pub range: Option<String>,
}

/// Arguments of `compare_periods`
#[derive(Debug, Clone, Deserialize)]
pub struct ComparePeriodsArgs {
    /// Metric field
    pub metric: String,
    /// Aggregation name
    pub aggregation: String,
    /// Current window
    pub period1: String,
    /// Baseline window
    pub period2: String,
}

/// Arguments of `detect_anomalies`
#[derive(Debug, Clone, Deserialize)]
pub struct DetectAnomaliesArgs {
    /// Metric field
    pub metric: String,
    /// Dimension to scan
    #[serde(default)]
    pub group_by: Option<String>,
    /// `high`, `medium` or `low`
    #[serde(default)]
    pub sensitivity: Option<String>,
    /// Range expression
    #[serde(default)]
    pub time_range: Option<String>,
}

/// Arguments of `get_summary_stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryStatsArgs {
    /// Range expression
    #[serde(default)]
    pub time_range: Option<String>,
}

/// A validated tool call ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    /// `get_field_info`
    FieldInfo {
        /// Field, derived metric or category to describe
        field_name: Option<String>,
    },
    /// `analyze_metric`
    AnalyzeMetric(AnalysisRequest),
    /// `get_trend`
    Trend(TrendRequest),
    /// `compare_periods`
    ComparePeriods(ComparisonRequest),
    /// `detect_anomalies`
    DetectAnomalies(AnomalyRequest),
    /// `get_summary_stats`
    SummaryStats {
        /// Range expression
        time_range: Option<String>,
    },
}

impl ToolInvocation {
    /// Tool this invocation dispatches to
    #[must_use]
    pub const fn tool(&self) -> ToolId {
        match self {
            Self::FieldInfo { .. } => ToolId::GetFieldInfo,
            Self::AnalyzeMetric(_) => ToolId::AnalyzeMetric,
            Self::Trend(_) => ToolId::GetTrend,
            Self::ComparePeriods(_) => ToolId::ComparePeriods,
            Self::DetectAnomalies(_) => ToolId::DetectAnomalies,
            Self::SummaryStats { .. } => ToolId::GetSummaryStats,
        }
    }

    /// Metric name the result describes, used for titles and format hints
    #[must_use]
    pub fn metric(&self) -> Option<&str> {
        match self {
            Self::AnalyzeMetric(request) => Some(
                request
                    .derived_metric
                    .as_deref()
                    .unwrap_or(&request.metric),
            ),
            Self::Trend(request) => Some(&request.metric),
            Self::ComparePeriods(request) => Some(&request.metric),
            Self::DetectAnomalies(request) => Some(&request.metric),
            Self::FieldInfo { .. } | Self::SummaryStats { .. } => None,
        }
    }

    /// Aggregation the result was computed with, when the tool takes one
    #[must_use]
    pub const fn aggregation(&self) -> Option<Aggregation> {
        match self {
            Self::AnalyzeMetric(request) if request.derived_metric.is_none() => {
                Some(request.aggregation)
            }
            Self::Trend(request) => Some(request.aggregation),
            Self::ComparePeriods(request) => Some(request.aggregation),
            _ => None,
        }
    }

    /// Validate raw arguments for a tool name
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` for names outside the catalog, `MissingParameter`
    /// for absent required arguments and `InvalidParameter` for values of the
    /// wrong type or outside their allowed set.
    pub fn parse(tool_name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let tool: ToolId = tool_name
            .parse()
            .map_err(|()| ToolError::unknown_tool(tool_name))?;
        let arguments = normalize_arguments(tool, arguments)?;

        match tool {
            ToolId::GetFieldInfo => {
                let args: FieldInfoArgs = deserialize(tool, arguments)?;
                Ok(Self::FieldInfo {
                    field_name: non_blank(args.field_name),
                })
            }
            ToolId::AnalyzeMetric => {
                let args: AnalyzeMetricArgs = deserialize(tool, arguments)?;
                let aggregation = parse_aggregation(tool, &args.aggregation)?;
                let limit = args
                    .limit
                    .map(|limit| {
                        usize::try_from(limit)
                            .ok()
                            .filter(|&limit| limit > 0)
                            .ok_or_else(|| {
                                ToolError::invalid_parameter(
                                    tool.name(),
                                    "limit",
                                    format!("expected a positive integer, got {limit}"),
                                )
                            })
                    })
                    .transpose()?;
                Ok(Self::AnalyzeMetric(AnalysisRequest {
                    metric: args.metric,
                    aggregation,
                    group_by: args.group_by,
                    derived_metric: non_blank(args.derived_metric),
                    limit,
                    time_range: non_blank(args.time_range),
                }))
            }
            ToolId::GetTrend => {
                let args: TrendArgs = deserialize(tool, arguments)?;
                let aggregation = parse_aggregation(tool, &args.aggregation)?;
                let period = args.period.parse::<TrendPeriod>().map_err(|e| {
                    ToolError::invalid_parameter(tool.name(), "period", e.0)
                })?;
                Ok(Self::Trend(TrendRequest {
                    metric: args.metric,
                    aggregation,
                    period,
                    range: non_blank(args.range),
                }))
            }
            ToolId::ComparePeriods => {
                let args: ComparePeriodsArgs = deserialize(tool, arguments)?;
                let aggregation = parse_aggregation(tool, &args.aggregation)?;
                Ok(Self::ComparePeriods(ComparisonRequest {
                    metric: args.metric,
                    aggregation,
                    period1: args.period1,
                    period2: args.period2,
                }))
            }
            ToolId::DetectAnomalies => {
                let args: DetectAnomaliesArgs = deserialize(tool, arguments)?;
                let sensitivity = non_blank(args.sensitivity)
                    .map(|raw| {
                        raw.parse::<Sensitivity>().map_err(|reason| {
                            ToolError::invalid_parameter(tool.name(), "sensitivity", reason)
                        })
                    })
                    .transpose()?;
                Ok(Self::DetectAnomalies(AnomalyRequest {
                    metric: args.metric,
                    group_by: non_blank(args.group_by),
                    sensitivity,
                    time_range: non_blank(args.time_range),
                }))
            }
            ToolId::GetSummaryStats => {
                let args: SummaryStatsArgs = deserialize(tool, arguments)?;
                Ok(Self::SummaryStats {
                    time_range: non_blank(args.time_range),
                })
            }
        }
    }
}

/// Check the argument object and its required keys before typed deserialization
fn normalize_arguments(tool: ToolId, arguments: &Value) -> Result<Value, ToolError> {
    let object = match arguments {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        Value::String(raw) => {
            return Err(ToolError::invalid_parameter(
                tool.name(),
                "arguments",
                format!("arguments must be a JSON object, got unparseable text '{raw}'"),
            ))
        }
        other => {
            return Err(ToolError::invalid_parameter(
                tool.name(),
                "arguments",
                format!("arguments must be a JSON object, got {other}"),
            ))
        }
    };

    for &parameter in tool.required_parameters() {
        let present = object.get(parameter).is_some_and(|value| {
            !value.is_null() && value.as_str().map_or(true, |s| !s.trim().is_empty())
        });
        if !present {
            return Err(ToolError::missing_parameter(tool.name(), parameter));
        }
    }
    Ok(Value::Object(object))
}

fn deserialize<T: DeserializeOwned>(tool: ToolId, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_parameter(tool.name(), "arguments", e.to_string()))
}

fn parse_aggregation(tool: ToolId, raw: &str) -> Result<Aggregation, ToolError> {
    raw.parse::<Aggregation>()
        .map_err(|reason| ToolError::invalid_parameter(tool.name(), "aggregation", reason))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected_parameter(error: &ToolError) -> Option<&str> {
        match error {
            ToolError::InvalidParameter { parameter, .. } => Some(parameter.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_parses_analyze_metric() {
        let args = json!({
            "metric": "retail",
            "aggregation": "sum",
            "group_by": "carrier_name",
            "limit": 3
        });
        let invocation = ToolInvocation::parse("analyze_metric", &args).unwrap();

        let ToolInvocation::AnalyzeMetric(request) = invocation else {
            panic!("expected analyze_metric");
        };
        assert_eq!(request.aggregation, Aggregation::Sum);
        assert_eq!(request.limit, Some(3));
        assert!(request.time_range.is_none());
    }

    #[test]
    fn test_parses_anomaly_time_range() {
        let args = json!({"metric": "cost", "time_range": "last_365_days"});
        let invocation = ToolInvocation::parse("detect_anomalies", &args).unwrap();

        let ToolInvocation::DetectAnomalies(request) = invocation else {
            panic!("expected detect_anomalies");
        };
        assert_eq!(request.time_range.as_deref(), Some("last_365_days"));
    }

    #[test]
    fn test_unknown_tool() {
        let error = ToolInvocation::parse("drop_table", &json!({})).unwrap_err();
        assert_eq!(error, ToolError::unknown_tool("drop_table"));
    }

    #[test]
    fn test_missing_and_blank_parameters() {
        let args = json!({"metric": "cost", "aggregation": "sum"});
        let error = ToolInvocation::parse("get_trend", &args).unwrap_err();
        assert_eq!(error, ToolError::missing_parameter("get_trend", "period"));

        let args = json!({
            "metric": "cost",
            "aggregation": "sum",
            "period1": "last_7_days",
            "period2": " "
        });
        let error = ToolInvocation::parse("compare_periods", &args).unwrap_err();
        assert_eq!(error, ToolError::missing_parameter("compare_periods", "period2"));
    }

    #[test]
    fn test_invalid_values_name_the_parameter() {
        let args = json!({"metric": "cost", "aggregation": "median", "group_by": "mode"});
        let error = ToolInvocation::parse("analyze_metric", &args).unwrap_err();
        assert_eq!(rejected_parameter(&error), Some("aggregation"));

        let args = json!({"metric": "cost", "aggregation": "sum", "group_by": "mode", "limit": 0});
        let error = ToolInvocation::parse("analyze_metric", &args).unwrap_err();
        assert_eq!(rejected_parameter(&error), Some("limit"));

        let args = json!({"metric": "cost", "sensitivity": "extreme"});
        let error = ToolInvocation::parse("detect_anomalies", &args).unwrap_err();
        assert_eq!(rejected_parameter(&error), Some("sensitivity"));
    }

    #[test]
    fn test_unparseable_arguments_are_invalid() {
        let args = Value::String("{oops".to_owned());
        let error = ToolInvocation::parse("get_summary_stats", &args).unwrap_err();
        assert!(error.is_argument_error());
        assert_eq!(rejected_parameter(&error), Some("arguments"));
    }

    #[test]
    fn test_optional_tools_accept_null_arguments() {
        assert_eq!(
            ToolInvocation::parse("get_field_info", &Value::Null).unwrap(),
            ToolInvocation::FieldInfo { field_name: None }
        );
        let args = json!({"time_range": "last_7_days"});
        assert_eq!(
            ToolInvocation::parse("get_summary_stats", &args).unwrap(),
            ToolInvocation::SummaryStats {
                time_range: Some("last_7_days".to_owned())
            }
        );
    }

    #[test]
    fn test_metric_prefers_derived_metric() {
        let args = json!({
            "metric": "cost",
            "aggregation": "sum",
            "group_by": "mode",
            "derived_metric": "cost_per_mile"
        });
        let invocation = ToolInvocation::parse("analyze_metric", &args).unwrap();
        assert_eq!(invocation.metric(), Some("cost_per_mile"));
        assert_eq!(invocation.aggregation(), None);
    }
}
