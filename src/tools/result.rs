// ABOUTME: Tool execution results fed back to the reasoning service and the visualization synthesizer
// ABOUTME: Carries the typed payload, its tabular rows, the row count and any structured error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Result Types
//!
//! A [`ToolResult`] is immutable once produced. Its rows are serialized into
//! the transcript as a `user` message naming the originating call id. The
//! typed payload feeds the reasoning trace and the visualization synthesizer.

use haulsight_analytics::results::{
    AnomalyScan, GroupedAnalysis, PeriodComparison, SummaryStats, Tabular, TrendSeries,
};
use haulsight_analytics::schema::DerivedMetricSpec;
use haulsight_analytics::{FieldMetadata, Row};
use serde::Serialize;
use serde_json::json;

use crate::errors::ToolError;

/// Field discovery output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCatalog {
    /// Matching stored fields
    pub fields: Vec<FieldMetadata>,
    /// Matching derived metrics
    pub derived_metrics: Vec<DerivedMetricSpec>,
}

impl Tabular for FieldCatalog {
    fn rows(&self) -> Vec<Row> {
        self.fields
            .iter()
            .map(|field| {
                Row::from([
                    ("name".to_owned(), field.name.into()),
                    ("type".to_owned(), format!("{:?}", field.field_type).to_lowercase().into()),
                    ("category".to_owned(), field.category.as_str().into()),
                    ("description".to_owned(), field.description.into()),
                    ("groupable".to_owned(), f64::from(u8::from(field.groupable)).into()),
                    ("aggregatable".to_owned(), f64::from(u8::from(field.aggregatable)).into()),
                ])
            })
            .chain(self.derived_metrics.iter().map(|spec| {
                Row::from([
                    ("name".to_owned(), spec.name.into()),
                    ("type".to_owned(), "derived".into()),
                    (
                        "formula".to_owned(),
                        format!("{} / {}", spec.numerator, spec.denominator).into(),
                    ),
                    ("unit".to_owned(), spec.unit.into()),
                ])
            }))
            .collect()
    }
}

/// Typed outcome of a successful tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ToolPayload {
    /// `get_field_info`
    FieldCatalog(FieldCatalog),
    /// `analyze_metric`
    GroupedAnalysis(GroupedAnalysis),
    /// `get_trend`
    Trend(TrendSeries),
    /// `compare_periods`
    Comparison(PeriodComparison),
    /// `detect_anomalies`
    Anomalies(AnomalyScan),
    /// `get_summary_stats`
    Summary(SummaryStats),
}

impl ToolPayload {
    /// Tabular projection of the payload
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        match self {
            Self::FieldCatalog(catalog) => catalog.rows(),
            Self::GroupedAnalysis(analysis) => analysis.rows(),
            Self::Trend(series) => series.rows(),
            Self::Comparison(comparison) => comparison.rows(),
            Self::Anomalies(scan) => scan.rows(),
            Self::Summary(summary) => summary.rows(),
        }
    }

    /// Row or group count reported to the model
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::FieldCatalog(catalog) => catalog.fields.len() + catalog.derived_metrics.len(),
            Self::GroupedAnalysis(analysis) => analysis.groups.len(),
            Self::Trend(series) => series.points.len(),
            Self::Comparison(_) => 2,
            Self::Anomalies(AnomalyScan::Completed(report)) => report.groups.len(),
            Self::Anomalies(AnomalyScan::InsufficientData { groups_found, .. }) => *groups_found,
            Self::Summary(summary) => summary.shipment_count,
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::FieldCatalog(catalog) => format!(
                "{} fields, {} derived metrics",
                catalog.fields.len(),
                catalog.derived_metrics.len()
            ),
            Self::GroupedAnalysis(analysis) => match analysis.groups.first() {
                Some(top) => format!(
                    "{} of {} groups by {}; top {} = {:.2}",
                    analysis.groups.len(),
                    analysis.total_groups,
                    analysis.group_by,
                    top.label,
                    top.value
                ),
                None => format!("No data for {} by {}", analysis.metric, analysis.group_by),
            },
            Self::Trend(series) => format!(
                "{} {} points for {}",
                series.points.len(),
                series.period,
                series.metric
            ),
            Self::Comparison(comparison) => format!(
                "{}: {:.2} vs {:.2} ({:+.1}%)",
                comparison.metric,
                comparison.current.value,
                comparison.baseline.value,
                comparison.percent_change
            ),
            Self::Anomalies(AnomalyScan::Completed(report)) => format!(
                "{} anomalies across {} {} groups",
                report.anomalies.len(),
                report.groups.len(),
                report.group_by
            ),
            Self::Anomalies(AnomalyScan::InsufficientData {
                groups_found,
                required,
                ..
            }) => format!("Insufficient data: {groups_found} groups, {required} required"),
            Self::Summary(summary) => format!("{} shipments", summary.shipment_count),
        }
    }
}

/// Outcome of one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Reasoning-service call id
    pub call_id: String,
    /// Tool name as requested
    pub tool: String,
    /// Whether the call produced a payload
    pub success: bool,
    /// Rows or groups returned
    pub row_count: usize,
    /// Tabular projection of the payload
    pub rows: Vec<Row>,
    /// Typed payload on success
    pub payload: Option<ToolPayload>,
    /// Structured error on failure
    pub error: Option<ToolError>,
}

impl ToolResult {
    /// Successful result
    #[must_use]
    pub fn ok(call_id: impl Into<String>, tool: impl Into<String>, payload: ToolPayload) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            success: true,
            row_count: payload.row_count(),
            rows: payload.rows(),
            payload: Some(payload),
            error: None,
        }
    }

    /// Failed result
    #[must_use]
    pub fn failed(call_id: impl Into<String>, tool: impl Into<String>, error: ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            success: false,
            row_count: 0,
            rows: Vec::new(),
            payload: None,
            error: Some(error),
        }
    }

    /// One-line summary for the reasoning trace
    #[must_use]
    pub fn summary(&self) -> String {
        match (&self.payload, &self.error) {
            (Some(payload), _) => payload.summary(),
            (None, Some(error)) => error.to_string(),
            (None, None) => "No result".to_owned(),
        }
    }

    /// Transcript message content naming the originating call
    #[must_use]
    pub fn to_transcript_message(&self) -> String {
        let body = match (&self.payload, &self.error) {
            (Some(payload), _) => json!({
                "success": true,
                "row_count": self.row_count,
                "summary": payload.summary(),
                "rows": self.rows,
            }),
            (None, error) => json!({
                "success": false,
                "error": error,
                "message": error.as_ref().map(ToString::to_string),
            }),
        };
        format!(
            "Tool result for call {} ({}): {body}",
            self.call_id, self.tool
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulsight_analytics::results::{GroupValue, GroupingKind};
    use haulsight_analytics::time::TimeWindow;
    use haulsight_analytics::SchemaRegistry;

    #[test]
    fn test_failed_result_transcript_carries_suggestions() {
        let result = ToolResult::failed(
            "call_7",
            "analyze_metric",
            ToolError::unknown_field("analyze_metric", "carrier", vec!["carrier_name".to_owned()]),
        );

        let message = result.to_transcript_message();
        assert!(message.starts_with("Tool result for call call_7 (analyze_metric): "));
        assert!(message.contains("\"suggestions\":[\"carrier_name\"]"));
        assert!(message.contains("\"success\":false"));
        assert_eq!(result.row_count, 0);
    }

    #[test]
    fn test_field_catalog_rows_cover_fields_and_derived_metrics() {
        let registry = SchemaRegistry::shipments();
        let catalog = FieldCatalog {
            fields: registry.list_fields(None).into_iter().cloned().collect(),
            derived_metrics: registry.derived_metrics().to_vec(),
        };
        let expected = catalog.fields.len() + catalog.derived_metrics.len();

        let result = ToolResult::ok("call_1", "get_field_info", ToolPayload::FieldCatalog(catalog));
        assert!(result.success);
        assert_eq!(result.row_count, expected);
        assert_eq!(result.rows.len(), expected);
        assert!(result.summary().contains("derived metrics"));
    }

    #[test]
    fn test_transcript_carries_named_rows() {
        let analysis = GroupedAnalysis {
            metric: "retail".to_owned(),
            aggregation: "sum".to_owned(),
            group_by: "carrier_name".to_owned(),
            grouping: GroupingKind::Categorical,
            window: TimeWindow::all_time(),
            total_groups: 2,
            groups: vec![
                GroupValue {
                    label: "B".to_owned(),
                    value: 300.0,
                    count: 1,
                },
                GroupValue {
                    label: "A".to_owned(),
                    value: 150.0,
                    count: 2,
                },
            ],
        };

        let result =
            ToolResult::ok("call_2", "analyze_metric", ToolPayload::GroupedAnalysis(analysis));
        let message = result.to_transcript_message();

        assert!(message.contains("\"row_count\":2"));
        assert!(message.contains("{\"count\":1.0,\"name\":\"B\",\"value\":300.0}"));
        assert!(message.contains("{\"count\":2.0,\"name\":\"A\",\"value\":150.0}"));
        assert!(message.contains("top B = 300.00"));
    }
}
