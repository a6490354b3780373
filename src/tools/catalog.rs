// ABOUTME: Closed set of investigation tools and their declarative JSON schemas
// ABOUTME: Builds the function declarations sent to the reasoning service on every turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::llm::FunctionDeclaration;

/// Identifier of a catalog tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    /// Field and derived-metric discovery
    GetFieldInfo,
    /// Grouped or bucketed aggregation
    AnalyzeMetric,
    /// Time trend
    GetTrend,
    /// Two-window comparison
    ComparePeriods,
    /// Outlier groups
    DetectAnomalies,
    /// Headline numbers
    GetSummaryStats,
}

impl ToolId {
    /// Every tool, in catalog order
    pub const ALL: [Self; 6] = [
        Self::GetFieldInfo,
        Self::AnalyzeMetric,
        Self::GetTrend,
        Self::ComparePeriods,
        Self::DetectAnomalies,
        Self::GetSummaryStats,
    ];

    /// Name the reasoning service uses
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetFieldInfo => "get_field_info",
            Self::AnalyzeMetric => "analyze_metric",
            Self::GetTrend => "get_trend",
            Self::ComparePeriods => "compare_periods",
            Self::DetectAnomalies => "detect_anomalies",
            Self::GetSummaryStats => "get_summary_stats",
        }
    }

    /// Parameters that must be present
    #[must_use]
    pub const fn required_parameters(self) -> &'static [&'static str] {
        match self {
            Self::GetFieldInfo | Self::GetSummaryStats => &[],
            Self::AnalyzeMetric => &["metric", "aggregation", "group_by"],
            Self::GetTrend => &["metric", "aggregation", "period"],
            Self::ComparePeriods => &["metric", "aggregation", "period1", "period2"],
            Self::DetectAnomalies => &["metric"],
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::GetFieldInfo => {
                "List the queryable shipment fields and derived metrics, or describe one field. Call this when unsure of a field name."
            }
            Self::AnalyzeMetric => {
                "Aggregate a metric per group. Numeric bucketable fields (miles, weight, transit_days) are grouped into fixed ranges. Use derived_metric for ratios such as cost_per_mile."
            }
            Self::GetTrend => "Aggregate a metric per day, week or month in chronological order.",
            Self::ComparePeriods => {
                "Compare a metric between a current window (period1) and a non-overlapping baseline window (period2), returning both values and the change."
            }
            Self::DetectAnomalies => {
                "Find groups whose average value is unusually far from the other groups."
            }
            Self::GetSummaryStats => {
                "Headline numbers: shipment count, totals and averages of the main metrics, on-time rate and top carriers, modes and lanes."
            }
        }
    }

    fn parameters(self) -> Value {
        let metric = json!({
            "type": "string",
            "description": "Metric field (retail, cost, margin, miles, weight, transit_days, on_time), a derived metric (cost_per_mile, revenue_per_mile, cost_per_pound, margin_rate) or 'shipments' to count rows"
        });
        let aggregation = json!({
            "type": "string",
            "enum": ["sum", "avg", "count", "min", "max"],
            "description": "Aggregation applied to the metric"
        });
        let time_range = json!({
            "type": "string",
            "description": "Time range such as last_30_days, previous_30_days, this_month, last_quarter, ytd, all_time or 2025-01-01..2025-03-31"
        });

        match self {
            Self::GetFieldInfo => json!({
                "type": "object",
                "properties": {
                    "field_name": {
                        "type": "string",
                        "description": "Field, derived metric or category (carrier, lane, shipment, financial, time). Omit to list everything."
                    }
                }
            }),
            Self::AnalyzeMetric => json!({
                "type": "object",
                "properties": {
                    "metric": metric,
                    "aggregation": aggregation,
                    "group_by": {
                        "type": "string",
                        "description": "Field to group by, e.g. carrier_name, mode, origin_state, destination_state, status, miles, weight, transit_days"
                    },
                    "derived_metric": {
                        "type": "string",
                        "description": "Ratio metric to compute instead of metric/aggregation"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "description": "Maximum groups to return (default 15)"
                    },
                    "time_range": time_range
                },
                "required": ["metric", "aggregation", "group_by"]
            }),
            Self::GetTrend => json!({
                "type": "object",
                "properties": {
                    "metric": metric,
                    "aggregation": aggregation,
                    "period": {
                        "type": "string",
                        "enum": ["day", "week", "month"],
                        "description": "Granularity of the trend"
                    },
                    "range": time_range
                },
                "required": ["metric", "aggregation", "period"]
            }),
            Self::ComparePeriods => json!({
                "type": "object",
                "properties": {
                    "metric": metric,
                    "aggregation": aggregation,
                    "period1": {
                        "type": "string",
                        "description": "Current window, e.g. last_30_days"
                    },
                    "period2": {
                        "type": "string",
                        "description": "Baseline window that does not overlap period1, e.g. previous_30_days"
                    }
                },
                "required": ["metric", "aggregation", "period1", "period2"]
            }),
            Self::DetectAnomalies => json!({
                "type": "object",
                "properties": {
                    "metric": metric,
                    "group_by": {
                        "type": "string",
                        "description": "Dimension to scan (default carrier_name)"
                    },
                    "sensitivity": {
                        "type": "string",
                        "enum": ["high", "medium", "low"],
                        "description": "high flags beyond 1.5 standard deviations, medium 2, low 3 (default medium)"
                    },
                    "time_range": time_range
                },
                "required": ["metric"]
            }),
            Self::GetSummaryStats => json!({
                "type": "object",
                "properties": {
                    "time_range": time_range
                }
            }),
        }
    }

    /// Declaration sent to the reasoning service
    #[must_use]
    pub fn declaration(self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: Some(self.parameters()),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|tool| tool.name() == s).ok_or(())
    }
}

/// Declarations for the whole catalog
#[must_use]
pub fn tool_catalog() -> Vec<FunctionDeclaration> {
    ToolId::ALL.into_iter().map(ToolId::declaration).collect()
}
