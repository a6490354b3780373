// ABOUTME: Typed query engine results and their projection to tabular rows
// ABOUTME: Grouped analyses, trends, period comparisons, anomaly scans and summary statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::row::{Row, Scalar};
use crate::statistics::Sensitivity;
use crate::time::{TimeWindow, TrendPeriod};

/// Projection of a result onto field-name → scalar rows
///
/// Grouped outputs use `name` for the group or period label and `value` for
/// the aggregate.
pub trait Tabular {
    /// Rows in result order
    fn rows(&self) -> Vec<Row>;
}

/// One aggregated group or bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue {
    /// Group value or bucket label
    pub label: String,
    /// Aggregated metric value
    pub value: f64,
    /// Rows in the group
    pub count: usize,
}

/// Which grouping branch produced an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingKind {
    /// Distinct string values
    Categorical,
    /// Fixed registry buckets
    Bucketed,
}

/// Result of `analyze_metric`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedAnalysis {
    /// Metric or derived metric name
    pub metric: String,
    /// Aggregation name (`ratio` for derived metrics)
    pub aggregation: String,
    /// Grouping field
    pub group_by: String,
    /// Grouping branch
    pub grouping: GroupingKind,
    /// Window the rows came from
    pub window: TimeWindow,
    /// Groups before truncation
    pub total_groups: usize,
    /// Groups in output order
    pub groups: Vec<GroupValue>,
}

impl Tabular for GroupedAnalysis {
    fn rows(&self) -> Vec<Row> {
        self.groups
            .iter()
            .map(|group| {
                Row::from([
                    ("name".to_owned(), Scalar::Text(group.label.clone())),
                    ("value".to_owned(), Scalar::Number(group.value)),
                    ("count".to_owned(), Scalar::Number(group.count as f64)),
                ])
            })
            .collect()
    }
}

/// One point of a trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Period key (`YYYY-MM-DD` or `YYYY-MM`)
    pub period: String,
    /// Aggregated value
    pub value: f64,
    /// Rows in the period
    pub count: usize,
}

/// Result of `get_trend`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    /// Metric or derived metric name
    pub metric: String,
    /// Aggregation name
    pub aggregation: String,
    /// Granularity
    pub period: TrendPeriod,
    /// Window covered
    pub window: TimeWindow,
    /// Points in chronological order
    pub points: Vec<TrendPoint>,
}

impl Tabular for TrendSeries {
    fn rows(&self) -> Vec<Row> {
        self.points
            .iter()
            .map(|point| {
                Row::from([
                    ("name".to_owned(), Scalar::Text(point.period.clone())),
                    ("value".to_owned(), Scalar::Number(point.value)),
                    ("count".to_owned(), Scalar::Number(point.count as f64)),
                ])
            })
            .collect()
    }
}

/// Aggregate over one comparison window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    /// Window expression
    pub label: String,
    /// Inclusive start
    pub start: Option<DateTime<Utc>>,
    /// Exclusive end
    pub end: Option<DateTime<Utc>>,
    /// Aggregated value (0 when the window is empty)
    pub value: f64,
    /// Rows in the window
    pub count: usize,
}

/// Result of `compare_periods`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    /// Metric or derived metric name
    pub metric: String,
    /// Aggregation name
    pub aggregation: String,
    /// `period1`
    pub current: PeriodValue,
    /// `period2`
    pub baseline: PeriodValue,
    /// `current - baseline`
    pub absolute_change: f64,
    /// Signed percent change relative to the baseline
    pub percent_change: f64,
}

impl Tabular for PeriodComparison {
    fn rows(&self) -> Vec<Row> {
        [&self.current, &self.baseline]
            .into_iter()
            .map(|period| {
                Row::from([
                    ("name".to_owned(), Scalar::Text(period.label.clone())),
                    ("value".to_owned(), Scalar::Number(period.value)),
                    ("count".to_owned(), Scalar::Number(period.count as f64)),
                ])
            })
            .collect()
    }
}

/// Side of the mean an anomaly falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyDirection {
    /// Above the mean
    High,
    /// Below the mean
    Low,
}

/// A flagged group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Group label
    pub label: String,
    /// Group value
    pub value: f64,
    /// Signed distance from the mean in standard deviations
    pub z_score: f64,
    /// Side of the mean
    pub direction: AnomalyDirection,
}

/// Completed anomaly scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    /// Metric or derived metric name
    pub metric: String,
    /// Aggregation applied per group
    pub aggregation: String,
    /// Grouping dimension
    pub group_by: String,
    /// Sensitivity used
    pub sensitivity: Sensitivity,
    /// Sigma multiplier used
    pub threshold_sigma: f64,
    /// Mean of group values
    pub mean: f64,
    /// Population standard deviation of group values
    pub std_dev: f64,
    /// All analyzed groups, largest first
    pub groups: Vec<GroupValue>,
    /// Flagged groups, most extreme first
    pub anomalies: Vec<Anomaly>,
}

/// Result of `detect_anomalies`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnomalyScan {
    /// Too few groups for a meaningful deviation
    InsufficientData {
        /// Metric name
        metric: String,
        /// Grouping dimension
        group_by: String,
        /// Groups with data
        groups_found: usize,
        /// Minimum groups required
        required: usize,
    },
    /// Scan ran
    Completed(AnomalyReport),
}

impl Tabular for AnomalyScan {
    fn rows(&self) -> Vec<Row> {
        let Self::Completed(report) = self else {
            return Vec::new();
        };
        report
            .groups
            .iter()
            .map(|group| {
                let flagged = report.anomalies.iter().find(|a| a.label == group.label);
                let z_score = if report.std_dev > 0.0 {
                    (group.value - report.mean) / report.std_dev
                } else {
                    0.0
                };
                Row::from([
                    ("name".to_owned(), Scalar::Text(group.label.clone())),
                    ("value".to_owned(), Scalar::Number(group.value)),
                    ("z_score".to_owned(), Scalar::Number(z_score)),
                    (
                        "anomaly".to_owned(),
                        flagged.map_or(Scalar::Null, |a| {
                            Scalar::Text(match a.direction {
                                AnomalyDirection::High => "high".to_owned(),
                                AnomalyDirection::Low => "low".to_owned(),
                            })
                        }),
                    ),
                ])
            })
            .collect()
    }
}

/// Totals for one primary metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Field name
    pub field: String,
    /// Sum of non-null values
    pub total: f64,
    /// Mean of non-null values
    pub average: f64,
}

/// Top values of one key dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    /// Field name
    pub field: String,
    /// Distinct values in the window
    pub distinct_values: usize,
    /// Most frequent values by shipment count
    pub top_values: Vec<GroupValue>,
}

/// Result of `get_summary_stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Window covered
    pub window: TimeWindow,
    /// Shipments in the window
    pub shipment_count: usize,
    /// Primary metric totals
    pub metrics: Vec<MetricSummary>,
    /// Share of shipments delivered on time (0-1), when known
    pub on_time_rate: Option<f64>,
    /// Key dimension breakdowns
    pub dimensions: Vec<DimensionSummary>,
}

impl Tabular for SummaryStats {
    fn rows(&self) -> Vec<Row> {
        let mut row = Row::new();
        row.insert("shipments".to_owned(), Scalar::Number(self.shipment_count as f64));
        for metric in &self.metrics {
            row.insert(format!("total_{}", metric.field), Scalar::Number(metric.total));
            row.insert(format!("avg_{}", metric.field), Scalar::Number(metric.average));
        }
        row.insert("on_time_rate".to_owned(), self.on_time_rate.into());
        vec![row]
    }
}
