// ABOUTME: Maps a tool invocation and its result to at most one chart descriptor
// ABOUTME: Chooses bar, line, pie or stat and a currency, percent or number format hint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Visualization Synthesizer
//!
//! [`synthesize`] is a pure function. Grouped results keep the order the query
//! engine returned, so charts and tables always agree.

use haulsight_analytics::results::{AnomalyScan, GroupingKind};
use haulsight_core::models::{
    ChartData, ChartKind, DataPoint, Direction, StatComparison, ValueFormat, Visualization,
};

use crate::tools::{ToolInvocation, ToolPayload, ToolResult};

/// Metric-name fragments that mark a percentage
const PERCENT_HINTS: [&str; 6] = ["rate", "ratio", "percent", "pct", "share", "on_time"];

/// Metric-name fragments that mark money
const CURRENCY_HINTS: [&str; 9] = [
    "cost", "spend", "price", "retail", "revenue", "margin", "charge", "fee", "amount",
];

/// Largest number of groups shown as a pie
const MAX_PIE_SLICES: usize = 5;

/// Format hint from a metric name; count aggregations are always plain numbers
#[must_use]
pub fn value_format(metric: &str, aggregation: &str) -> ValueFormat {
    if aggregation == "count" {
        return ValueFormat::Number;
    }
    let name = metric.to_lowercase();
    if PERCENT_HINTS.iter().any(|hint| name.contains(hint)) {
        ValueFormat::Percent
    } else if CURRENCY_HINTS.iter().any(|hint| name.contains(hint)) {
        ValueFormat::Currency
    } else {
        ValueFormat::Number
    }
}

/// `carrier_name` → `Carrier Name`
fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn aggregation_label(aggregation: &str) -> &str {
    match aggregation {
        "sum" => "Total",
        "avg" => "Average",
        "count" => "Count of",
        "min" => "Minimum",
        "max" => "Maximum",
        _ => "",
    }
}

fn metric_title(metric: &str, aggregation: &str) -> String {
    let label = aggregation_label(aggregation);
    if label.is_empty() {
        humanize(metric)
    } else {
        format!("{label} {}", humanize(metric))
    }
}

fn range_suffix(invocation: &ToolInvocation) -> String {
    let range = match invocation {
        ToolInvocation::AnalyzeMetric(request) => request.time_range.as_deref(),
        ToolInvocation::Trend(request) => request.range.as_deref(),
        ToolInvocation::SummaryStats { time_range } => time_range.as_deref(),
        _ => None,
    };
    range.map_or_else(String::new, |range| format!(" ({})", range.replace('_', " ")))
}

/// Chart for one tool result, if the result is chartable
#[must_use]
pub fn synthesize(invocation: &ToolInvocation, result: &ToolResult) -> Option<Visualization> {
    if !result.success {
        return None;
    }
    let id = format!("viz-{}", result.call_id);
    let suffix = range_suffix(invocation);

    match result.payload.as_ref()? {
        ToolPayload::FieldCatalog(_) => None,
        ToolPayload::GroupedAnalysis(analysis) => {
            if analysis.groups.is_empty() {
                return None;
            }
            let is_count = analysis.aggregation == "count";
            let kind = if is_count
                && analysis.grouping == GroupingKind::Categorical
                && (2..=MAX_PIE_SLICES).contains(&analysis.groups.len())
            {
                ChartKind::Pie
            } else {
                ChartKind::Bar
            };
            let title = if kind == ChartKind::Pie {
                format!("Share of Shipments by {}{suffix}", humanize(&analysis.group_by))
            } else {
                format!(
                    "{} by {}{suffix}",
                    metric_title(&analysis.metric, &analysis.aggregation),
                    humanize(&analysis.group_by)
                )
            };
            Some(Visualization {
                id,
                kind,
                title,
                format: value_format(&analysis.metric, &analysis.aggregation),
                data: ChartData::Series {
                    points: analysis
                        .groups
                        .iter()
                        .map(|group| DataPoint::new(&group.label, group.value))
                        .collect(),
                },
            })
        }
        ToolPayload::Trend(series) => {
            if series.points.is_empty() {
                return None;
            }
            Some(Visualization {
                id,
                kind: ChartKind::Line,
                title: format!(
                    "{} per {}{suffix}",
                    metric_title(&series.metric, &series.aggregation),
                    series.period
                ),
                format: value_format(&series.metric, &series.aggregation),
                data: ChartData::Series {
                    points: series
                        .points
                        .iter()
                        .map(|point| DataPoint::new(&point.period, point.value))
                        .collect(),
                },
            })
        }
        ToolPayload::Comparison(comparison) => Some(Visualization {
            id,
            kind: ChartKind::Stat,
            title: format!(
                "{}: {} vs {}",
                metric_title(&comparison.metric, &comparison.aggregation),
                comparison.current.label.replace('_', " "),
                comparison.baseline.label.replace('_', " ")
            ),
            format: value_format(&comparison.metric, &comparison.aggregation),
            data: ChartData::Scalar {
                value: comparison.current.value,
                comparison: Some(StatComparison {
                    previous_value: comparison.baseline.value,
                    percent_change: comparison.percent_change,
                    direction: Direction::from_change(comparison.percent_change),
                }),
            },
        }),
        ToolPayload::Anomalies(AnomalyScan::Completed(report)) => {
            if report.groups.is_empty() {
                return None;
            }
            Some(Visualization {
                id,
                kind: ChartKind::Bar,
                title: format!(
                    "{} by {} (anomalies highlighted)",
                    metric_title(&report.metric, &report.aggregation),
                    humanize(&report.group_by)
                ),
                format: value_format(&report.metric, &report.aggregation),
                data: ChartData::Series {
                    points: report
                        .groups
                        .iter()
                        .map(|group| DataPoint {
                            highlighted: report.anomalies.iter().any(|a| a.label == group.label),
                            ..DataPoint::new(&group.label, group.value)
                        })
                        .collect(),
                },
            })
        }
        ToolPayload::Anomalies(AnomalyScan::InsufficientData { .. }) => None,
        ToolPayload::Summary(summary) => {
            if summary.shipment_count == 0 {
                return None;
            }
            Some(Visualization {
                id,
                kind: ChartKind::Stat,
                title: format!("Shipments{suffix}"),
                format: ValueFormat::Number,
                data: ChartData::Scalar {
                    value: summary.shipment_count as f64,
                    comparison: None,
                },
            })
        }
    }
}
