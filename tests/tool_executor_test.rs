// ABOUTME: Integration tests for tool dispatch and chart synthesis over fixture shipments
// ABOUTME: Covers every tool, argument rejection, cancellation and the chart chosen per result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::float_cmp)]

mod common;
mod helpers;

use haulsight_core::models::{ChartData, ChartKind, Direction, ValueFormat};
use haulsight_server::errors::ToolError;
use haulsight_server::tools::{ToolExecutor, ToolInvocation, ToolPayload, ToolResult};
use haulsight_server::visualization::synthesize;
use helpers::scripted_reasoning::call;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

async fn run(name: &str, args: Value) -> (Option<ToolInvocation>, ToolResult) {
    common::init_test_logging();
    let executor = ToolExecutor::new(common::fixture_engine());
    executor
        .execute(
            &common::scope(),
            &call("call_1", name, args),
            &CancellationToken::new(),
        )
        .await
}

#[tokio::test]
async fn test_field_info_lists_everything_without_a_name() {
    let (_, result) = run("get_field_info", json!({})).await;

    let Some(ToolPayload::FieldCatalog(catalog)) = &result.payload else {
        panic!("expected a field catalog, got {result:?}");
    };
    assert!(catalog.fields.iter().any(|f| f.name == "carrier_name"));
    assert!(catalog.derived_metrics.iter().any(|d| d.name == "cost_per_mile"));
    assert_eq!(result.row_count, catalog.fields.len() + catalog.derived_metrics.len());
}

#[tokio::test]
async fn test_field_info_resolves_fields_metrics_and_categories() {
    let (_, field) = run("get_field_info", json!({"field_name": "carrier_name"})).await;
    assert_eq!(field.row_count, 1);

    let (_, derived) = run("get_field_info", json!({"field_name": "cost_per_mile"})).await;
    let Some(ToolPayload::FieldCatalog(catalog)) = &derived.payload else {
        panic!("expected a field catalog");
    };
    assert_eq!(catalog.derived_metrics.len(), 1);
    assert!(catalog.fields.is_empty());

    let (_, category) = run("get_field_info", json!({"field_name": "financial"})).await;
    assert_eq!(category.row_count, 3);

    let (_, unknown) = run("get_field_info", json!({"field_name": "carrier_nam"})).await;
    assert!(!unknown.success);
    match unknown.error.unwrap() {
        ToolError::UnknownField { suggestions, .. } => {
            assert!(suggestions.contains(&"carrier_name".to_owned()));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_analyze_metric_yields_sorted_bar_chart() {
    let (invocation, result) = run(
        "analyze_metric",
        json!({"metric": "cost", "aggregation": "sum", "group_by": "carrier_name", "limit": 2}),
    )
    .await;

    assert!(result.success);
    assert_eq!(result.row_count, 2);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.kind, ChartKind::Bar);
    assert_eq!(chart.format, ValueFormat::Currency);
    let ChartData::Series { points } = chart.data else {
        panic!("expected a series");
    };
    assert_eq!(points[0].label, "Old Dominion");
    assert_eq!(points[0].value, 1600.0);
    assert_eq!(points[1].label, "Saia");
}

#[tokio::test]
async fn test_derived_metric_is_a_ratio_of_totals() {
    let (invocation, result) = run(
        "analyze_metric",
        json!({
            "metric": "cost",
            "aggregation": "sum",
            "group_by": "carrier_name",
            "derived_metric": "cost_per_mile"
        }),
    )
    .await;

    let Some(ToolPayload::GroupedAnalysis(analysis)) = &result.payload else {
        panic!("expected grouped analysis");
    };
    assert_eq!(analysis.aggregation, "ratio");
    let saia = analysis.groups.iter().find(|g| g.label == "Saia").unwrap();
    assert_eq!(saia.value, 2.0);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.format, ValueFormat::Currency);
}

#[tokio::test]
async fn test_trend_yields_line_chart() {
    let (invocation, result) = run(
        "get_trend",
        json!({"metric": "cost", "aggregation": "sum", "period": "week", "range": "last_30_days"}),
    )
    .await;

    assert!(result.success, "{:?}", result.error);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.kind, ChartKind::Line);
    let ChartData::Series { points } = chart.data else {
        panic!("expected a series");
    };
    let total: f64 = points.iter().map(|p| p.value).sum();
    assert_eq!(total, 2550.0);
}

#[tokio::test]
async fn test_compare_periods_yields_stat_with_change() {
    let (invocation, result) = run(
        "compare_periods",
        json!({
            "metric": "cost",
            "aggregation": "sum",
            "period1": "last_7_days",
            "period2": "previous_7_days"
        }),
    )
    .await;

    assert!(result.success, "{:?}", result.error);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.kind, ChartKind::Stat);
    let ChartData::Scalar { value, comparison } = chart.data else {
        panic!("expected a scalar");
    };
    assert_eq!(value, 1300.0);
    let comparison = comparison.unwrap();
    assert_eq!(comparison.previous_value, 1250.0);
    assert!((comparison.percent_change - 4.0).abs() < 1e-9);
    assert_eq!(comparison.direction, Direction::Up);
}

#[tokio::test]
async fn test_overlapping_periods_are_rejected() {
    let (_, result) = run(
        "compare_periods",
        json!({
            "metric": "cost",
            "aggregation": "sum",
            "period1": "last_30_days",
            "period2": "last_7_days"
        }),
    )
    .await;

    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(ToolError::InvalidParameter { ref parameter, .. }) if parameter == "period2"
    ));
}

#[tokio::test]
async fn test_anomaly_scan_highlights_outliers() {
    let (invocation, result) = run(
        "detect_anomalies",
        json!({"metric": "cost", "group_by": "carrier_name", "sensitivity": "high"}),
    )
    .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.row_count, 3);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.kind, ChartKind::Bar);
    assert!(chart.title.contains("anomalies highlighted"));
}

#[tokio::test]
async fn test_anomaly_scan_needs_three_groups() {
    let (invocation, result) = run(
        "detect_anomalies",
        json!({"metric": "cost", "group_by": "mode"}),
    )
    .await;

    assert!(result.success);
    assert!(result.summary().starts_with("Insufficient data"));
    assert!(synthesize(&invocation.unwrap(), &result).is_none());
}

#[tokio::test]
async fn test_missing_and_unknown_inputs_fail_without_dispatch() {
    let (invocation, missing) = run(
        "analyze_metric",
        json!({"metric": "cost", "aggregation": "sum"}),
    )
    .await;
    assert!(invocation.is_none());
    assert!(matches!(
        missing.error,
        Some(ToolError::MissingParameter { ref parameter, .. }) if parameter == "group_by"
    ));

    let (invocation, unknown) = run("get_weather", json!({})).await;
    assert!(invocation.is_none());
    assert!(matches!(unknown.error, Some(ToolError::UnknownTool { .. })));

    let (_, garbled) = run("get_summary_stats", Value::String("{not json".to_owned())).await;
    assert!(matches!(
        garbled.error,
        Some(ToolError::InvalidParameter { ref parameter, .. }) if parameter == "arguments"
    ));
}

#[tokio::test]
async fn test_cancelled_token_skips_the_query() {
    common::init_test_logging();
    let executor = ToolExecutor::new(common::fixture_engine());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (invocation, result) = executor
        .execute(
            &common::scope(),
            &call("call_9", "get_summary_stats", json!({})),
            &cancel,
        )
        .await;

    assert!(invocation.is_some());
    assert!(!result.success);
    assert!(matches!(result.error, Some(ToolError::Cancelled { .. })));
}

#[tokio::test]
async fn test_summary_stats_counts_window() {
    let (invocation, result) = run("get_summary_stats", json!({"time_range": "last_7_days"})).await;

    let Some(ToolPayload::Summary(summary)) = &result.payload else {
        panic!("expected summary stats");
    };
    assert_eq!(summary.shipment_count, 2);
    let chart = synthesize(&invocation.unwrap(), &result).unwrap();
    assert_eq!(chart.kind, ChartKind::Stat);
    assert!(chart.title.contains("last 7 days"));
}

#[tokio::test]
async fn test_anomaly_scan_passes_time_range_through() {
    let (invocation, result) = run(
        "detect_anomalies",
        json!({"metric": "cost", "group_by": "carrier_name", "time_range": "since forever"}),
    )
    .await;

    assert!(invocation.is_some());
    assert!(matches!(
        result.error,
        Some(ToolError::InvalidParameter { ref parameter, .. }) if parameter == "time_range"
    ));
}
