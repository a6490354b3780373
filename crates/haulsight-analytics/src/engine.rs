// ABOUTME: Query engine entry points: grouped analysis, trends, period comparison, anomalies, summary
// ABOUTME: Validates names against the registry, fetches tenant rows and aggregates them in memory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Query Engine
//!
//! All operations are read-only and scoped to one customer through
//! [`QueryScope`]. Field names are resolved against the
//! [`SchemaRegistry`] before anything reaches the [`DataStore`], so the store
//! only ever sees registry column names.
//!
//! Relative time ranges are resolved against `QueryScope::as_of`, which keeps
//! results reproducible in tests.

use std::collections::BTreeMap;
use std::iter;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use haulsight_core::constants::query::{
    DEFAULT_GROUP_LIMIT, DEFAULT_LOOKBACK_DAYS, MAX_FETCH_ROWS, MAX_GROUP_LIMIT,
    MAX_LOOKBACK_DAYS, MIN_ANOMALY_GROUPS, SUMMARY_LOOKBACK_DAYS, SUMMARY_TOP_VALUES,
};
use tracing::{debug, instrument};

use crate::aggregation::{
    group_bucketed, group_categorical, Aggregation, MetricAccumulator, MetricPlan,
};
use crate::error::QueryError;
use crate::results::{
    AnomalyReport, AnomalyScan, DimensionSummary, GroupValue, GroupedAnalysis, GroupingKind,
    MetricSummary, PeriodComparison, PeriodValue, SummaryStats, TrendPoint, TrendSeries,
};
use crate::row::{Row, Scalar};
use crate::schema::{Bucket, FieldMetadata, MetricRef, SchemaRegistry, SHIPMENT_COUNT_METRIC};
use crate::statistics::{Sensitivity, StatisticalAnalyzer};
use crate::store::{ColumnRef, DataStore, RowQuery};
use crate::time::{resolve_range, TimeWindow, TrendPeriod};

/// Dimension scanned for anomalies when none is given
pub const DEFAULT_ANOMALY_DIMENSION: &str = "carrier_name";

/// 0/1 delivery flag used for the on-time rate
const ON_TIME_FIELD: &str = "on_time";

// ============================================================================
// Requests
// ============================================================================

/// Tenant and clock for one investigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScope {
    /// Customer whose rows may be read
    pub customer_id: String,
    /// Instant relative ranges are resolved against
    pub as_of: DateTime<Utc>,
}

impl QueryScope {
    /// Scope with an explicit clock
    pub fn new(customer_id: impl Into<String>, as_of: DateTime<Utc>) -> Self {
        Self {
            customer_id: customer_id.into(),
            as_of,
        }
    }

    /// Scope anchored at the current time
    pub fn now(customer_id: impl Into<String>) -> Self {
        Self::new(customer_id, Utc::now())
    }
}

/// Grouped metric analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Metric field (ignored when `derived_metric` is set)
    pub metric: String,
    /// Aggregation (ignored when `derived_metric` is set)
    pub aggregation: Aggregation,
    /// Grouping field
    pub group_by: String,
    /// Ratio metric to compute instead of `metric`
    pub derived_metric: Option<String>,
    /// Maximum groups (categorical only)
    pub limit: Option<usize>,
    /// Range expression, default last 90 days
    pub time_range: Option<String>,
}

impl AnalysisRequest {
    /// Request with defaults for the optional parts
    pub fn new(
        metric: impl Into<String>,
        aggregation: Aggregation,
        group_by: impl Into<String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            aggregation,
            group_by: group_by.into(),
            derived_metric: None,
            limit: None,
            time_range: None,
        }
    }

    /// Compute a derived ratio metric
    #[must_use]
    pub fn with_derived_metric(mut self, derived: impl Into<String>) -> Self {
        self.derived_metric = Some(derived.into());
        self
    }

    /// Limit the number of groups
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict to a time range
    #[must_use]
    pub fn with_time_range(mut self, range: impl Into<String>) -> Self {
        self.time_range = Some(range.into());
        self
    }
}

/// Time trend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendRequest {
    /// Metric or derived metric
    pub metric: String,
    /// Aggregation for plain metrics
    pub aggregation: Aggregation,
    /// Granularity
    pub period: TrendPeriod,
    /// Range expression, default depends on the period
    pub range: Option<String>,
}

/// Two-window comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    /// Metric or derived metric
    pub metric: String,
    /// Aggregation for plain metrics
    pub aggregation: Aggregation,
    /// Current window expression
    pub period1: String,
    /// Baseline window expression
    pub period2: String,
}

/// Anomaly scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyRequest {
    /// Metric or derived metric
    pub metric: String,
    /// Dimension, default `carrier_name`
    pub group_by: Option<String>,
    /// Sensitivity, default medium
    pub sensitivity: Option<Sensitivity>,
    /// Range expression, default last 90 days
    pub time_range: Option<String>,
}

/// Grouping branch chosen once per analysis from the grouping field's metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisPlan<'a> {
    /// Group by distinct values
    Categorical(&'a FieldMetadata),
    /// Group by fixed registry buckets
    Bucketed(&'a FieldMetadata, &'static [Bucket]),
}

impl<'a> AnalysisPlan<'a> {
    /// Choose the branch for a grouping field
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedField` when the field can be neither grouped nor bucketed.
    pub fn for_field(field: &'a FieldMetadata) -> Result<Self, QueryError> {
        if field.bucketable && !field.buckets.is_empty() {
            Ok(Self::Bucketed(field, field.buckets))
        } else if field.groupable {
            Ok(Self::Categorical(field))
        } else {
            Err(QueryError::UnsupportedField {
                field: field.name.to_owned(),
                role: "as a grouping dimension",
            })
        }
    }

    /// Grouping field
    #[must_use]
    pub const fn field(&self) -> &'a FieldMetadata {
        match *self {
            Self::Categorical(field) | Self::Bucketed(field, _) => field,
        }
    }

    fn group(
        &self,
        rows: &[Row],
        metric: &MetricPlan,
        limit: usize,
    ) -> (Vec<GroupValue>, usize, GroupingKind) {
        match self {
            Self::Categorical(field) => {
                let (groups, total) = group_categorical(rows, field.name, metric, limit);
                (groups, total, GroupingKind::Categorical)
            }
            Self::Bucketed(field, buckets) => {
                let groups = group_bucketed(rows, field.name, buckets, metric);
                let total = groups.len();
                (groups, total, GroupingKind::Bucketed)
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Analytic query engine over a tenant-scoped data store
#[derive(Clone)]
pub struct QueryEngine {
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn DataStore>,
    max_rows: usize,
}

impl QueryEngine {
    /// Create an engine
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>, store: Arc<dyn DataStore>) -> Self {
        Self {
            registry,
            store,
            max_rows: MAX_FETCH_ROWS,
        }
    }

    /// Cap on rows one fetch may load; a window matching more is rejected
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    /// The registry queries are validated against
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Aggregate a metric per group (categorical) or per bucket (bucketed)
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for unknown or unsuitable fields, bad ranges,
    /// or a failing data store.
    #[instrument(
        skip(self, request),
        fields(
            customer_id = %scope.customer_id,
            metric = %request.metric,
            group_by = %request.group_by
        )
    )]
    pub async fn analyze_metric(
        &self,
        scope: &QueryScope,
        request: &AnalysisRequest,
    ) -> Result<GroupedAnalysis, QueryError> {
        let group_field = self.registry.describe_field(&request.group_by)?;
        let plan = AnalysisPlan::for_field(group_field)?;
        let metric = self.metric_plan(
            &request.metric,
            request.aggregation,
            request.derived_metric.as_deref(),
        )?;
        let limit = request
            .limit
            .unwrap_or(DEFAULT_GROUP_LIMIT)
            .clamp(1, MAX_GROUP_LIMIT);
        let window = resolve_window(
            scope,
            request.time_range.as_deref(),
            DEFAULT_LOOKBACK_DAYS,
            "time_range",
        )?;

        let columns = iter::once(group_field.name).chain(metric.columns());
        let rows = self.fetch(scope, columns, window.clone(), "time_range").await?;
        let (groups, total_groups, grouping) = plan.group(&rows, &metric, limit);

        Ok(GroupedAnalysis {
            metric: metric_name(&metric).to_owned(),
            aggregation: metric.aggregation_name().to_owned(),
            group_by: group_field.name.to_owned(),
            grouping,
            window,
            total_groups,
            groups,
        })
    }

    /// Aggregate a metric per day, week or month in chronological order
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for unknown metrics, bad ranges or store failures.
    #[instrument(
        skip(self, request),
        fields(customer_id = %scope.customer_id, metric = %request.metric, period = %request.period)
    )]
    pub async fn trend(
        &self,
        scope: &QueryScope,
        request: &TrendRequest,
    ) -> Result<TrendSeries, QueryError> {
        let metric = self.metric_plan(&request.metric, request.aggregation, None)?;
        let window = resolve_window(
            scope,
            request.range.as_deref(),
            request.period.default_lookback_days(),
            "range",
        )?
        .bounded(MAX_LOOKBACK_DAYS, scope.as_of);

        let time_field = self.registry.time_field();
        let columns = iter::once(time_field).chain(metric.columns());
        let rows = self.fetch(scope, columns, window.clone(), "range").await?;

        let mut periods: BTreeMap<NaiveDate, MetricAccumulator> = BTreeMap::new();
        for row in &rows {
            let Some(ts) = row.get(time_field).and_then(Scalar::as_timestamp) else {
                continue;
            };
            periods
                .entry(request.period.period_start(ts))
                .or_insert_with(|| metric.accumulator())
                .push(row);
        }

        let points = periods
            .into_iter()
            .filter_map(|(start, acc)| {
                acc.value().map(|value| TrendPoint {
                    period: request.period.label(start),
                    value,
                    count: acc.rows(),
                })
            })
            .collect();

        Ok(TrendSeries {
            metric: metric_name(&metric).to_owned(),
            aggregation: metric.aggregation_name().to_owned(),
            period: request.period,
            window,
            points,
        })
    }

    /// Aggregate a metric over two non-overlapping windows and report the change
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for unknown metrics, unparseable or overlapping
    /// windows, or store failures.
    #[instrument(
        skip(self, request),
        fields(customer_id = %scope.customer_id, metric = %request.metric)
    )]
    pub async fn compare_periods(
        &self,
        scope: &QueryScope,
        request: &ComparisonRequest,
    ) -> Result<PeriodComparison, QueryError> {
        let metric = self.metric_plan(&request.metric, request.aggregation, None)?;
        let current_window = resolve_range(&request.period1, scope.as_of)
            .map_err(|e| QueryError::invalid("period1", e.0))?;
        let baseline_window = resolve_range(&request.period2, scope.as_of)
            .map_err(|e| QueryError::invalid("period2", e.0))?;
        if current_window.overlaps(&baseline_window) {
            return Err(QueryError::invalid(
                "period2",
                format!(
                    "'{}' overlaps '{}'; choose non-overlapping windows such as last_30_days and previous_30_days",
                    request.period2, request.period1
                ),
            ));
        }

        let current = self
            .period_value(scope, &metric, current_window, "period1")
            .await?;
        let baseline = self
            .period_value(scope, &metric, baseline_window, "period2")
            .await?;
        let percent_change = StatisticalAnalyzer::percent_change(current.value, baseline.value);

        Ok(PeriodComparison {
            metric: metric_name(&metric).to_owned(),
            aggregation: metric.aggregation_name().to_owned(),
            absolute_change: current.value - baseline.value,
            percent_change,
            current,
            baseline,
        })
    }

    /// Flag groups whose value deviates from the mean by more than k·σ
    ///
    /// Plain metrics are averaged per group so groups of different sizes stay
    /// comparable; derived metrics use their ratio.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for unknown fields or store failures. Too few
    /// groups is not an error: it yields [`AnomalyScan::InsufficientData`].
    #[instrument(
        skip(self, request),
        fields(customer_id = %scope.customer_id, metric = %request.metric)
    )]
    pub async fn detect_anomalies(
        &self,
        scope: &QueryScope,
        request: &AnomalyRequest,
    ) -> Result<AnomalyScan, QueryError> {
        let group_by = request.group_by.as_deref().unwrap_or(DEFAULT_ANOMALY_DIMENSION);
        let plan = AnalysisPlan::for_field(self.registry.describe_field(group_by)?)?;
        let metric = self.metric_plan(&request.metric, Aggregation::Avg, None)?;
        let sensitivity = request.sensitivity.unwrap_or_default();
        let window = resolve_window(
            scope,
            request.time_range.as_deref(),
            DEFAULT_LOOKBACK_DAYS,
            "time_range",
        )?;

        let columns = iter::once(plan.field().name).chain(metric.columns());
        let rows = self.fetch(scope, columns, window, "time_range").await?;
        let (groups, _, _) = plan.group(&rows, &metric, usize::MAX);

        if groups.len() < MIN_ANOMALY_GROUPS {
            debug!(groups = groups.len(), "Too few groups for anomaly scan");
            return Ok(AnomalyScan::InsufficientData {
                metric: metric_name(&metric).to_owned(),
                group_by: plan.field().name.to_owned(),
                groups_found: groups.len(),
                required: MIN_ANOMALY_GROUPS,
            });
        }

        let (mean, std_dev, anomalies) =
            StatisticalAnalyzer::detect_anomalies(&groups, sensitivity.sigma());
        debug!(anomalies = anomalies.len(), mean, std_dev, "Anomaly scan complete");

        Ok(AnomalyScan::Completed(AnomalyReport {
            metric: metric_name(&metric).to_owned(),
            aggregation: metric.aggregation_name().to_owned(),
            group_by: plan.field().name.to_owned(),
            sensitivity,
            threshold_sigma: sensitivity.sigma(),
            mean,
            std_dev,
            groups,
            anomalies,
        }))
    }

    /// Headline numbers for a window: counts, primary metric totals, top dimension values
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for bad ranges or store failures.
    #[instrument(skip(self), fields(customer_id = %scope.customer_id))]
    pub async fn summary_stats(
        &self,
        scope: &QueryScope,
        time_range: Option<&str>,
    ) -> Result<SummaryStats, QueryError> {
        let window = resolve_window(scope, time_range, SUMMARY_LOOKBACK_DAYS, "time_range")?;
        let has_on_time = self.registry.describe_field(ON_TIME_FIELD).is_ok();

        let columns = self
            .registry
            .primary_metrics()
            .iter()
            .chain(self.registry.key_dimensions())
            .copied()
            .chain(has_on_time.then_some(ON_TIME_FIELD));
        let rows = self
            .fetch(scope, columns, window.clone(), "time_range")
            .await?;

        let metrics = self
            .registry
            .primary_metrics()
            .iter()
            .map(|&field| {
                let sum = MetricPlan::Aggregate {
                    field,
                    aggregation: Aggregation::Sum,
                };
                let avg = MetricPlan::Aggregate {
                    field,
                    aggregation: Aggregation::Avg,
                };
                MetricSummary {
                    field: field.to_owned(),
                    total: sum.evaluate(&rows).0.unwrap_or(0.0),
                    average: avg.evaluate(&rows).0.unwrap_or(0.0),
                }
            })
            .collect();

        let on_time_rate = has_on_time
            .then(|| {
                MetricPlan::Aggregate {
                    field: ON_TIME_FIELD,
                    aggregation: Aggregation::Avg,
                }
                .evaluate(&rows)
                .0
            })
            .flatten();

        let dimensions = self
            .registry
            .key_dimensions()
            .iter()
            .map(|&field| {
                let (top_values, distinct_values) =
                    group_categorical(&rows, field, &MetricPlan::RowCount, SUMMARY_TOP_VALUES);
                DimensionSummary {
                    field: field.to_owned(),
                    distinct_values,
                    top_values,
                }
            })
            .collect();

        Ok(SummaryStats {
            window,
            shipment_count: rows.len(),
            metrics,
            on_time_rate,
            dimensions,
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn metric_plan(
        &self,
        metric: &str,
        aggregation: Aggregation,
        derived: Option<&str>,
    ) -> Result<MetricPlan, QueryError> {
        if let Some(derived) = derived.filter(|d| !d.trim().is_empty()) {
            let spec = self.registry.derived_metric(derived)?;
            return Ok(ratio_plan(spec.name, spec.numerator, spec.denominator));
        }
        match self.registry.resolve_metric(metric)? {
            MetricRef::ShipmentCount => Ok(MetricPlan::RowCount),
            MetricRef::Derived(spec) => {
                Ok(ratio_plan(spec.name, spec.numerator, spec.denominator))
            }
            MetricRef::Field(field)
                if field.aggregatable || aggregation == Aggregation::Count =>
            {
                Ok(MetricPlan::Aggregate {
                    field: field.name,
                    aggregation,
                })
            }
            MetricRef::Field(field) => Err(QueryError::UnsupportedField {
                field: field.name.to_owned(),
                role: "as an aggregated metric (only count applies)",
            }),
        }
    }

    async fn period_value(
        &self,
        scope: &QueryScope,
        metric: &MetricPlan,
        window: TimeWindow,
        parameter: &'static str,
    ) -> Result<PeriodValue, QueryError> {
        let rows = self
            .fetch(scope, metric.columns(), window.clone(), parameter)
            .await?;
        let (value, count) = metric.evaluate(&rows);
        Ok(PeriodValue {
            label: window.label,
            start: window.start,
            end: window.end,
            value: value.unwrap_or(0.0),
            count,
        })
    }

    /// Load the named columns for the window, rejecting windows over the row cap
    async fn fetch(
        &self,
        scope: &QueryScope,
        names: impl IntoIterator<Item = &'static str>,
        window: TimeWindow,
        parameter: &'static str,
    ) -> Result<Vec<Row>, QueryError> {
        let mut columns: Vec<ColumnRef> = Vec::new();
        for name in names {
            if columns.iter().any(|c| c.name == name) {
                continue;
            }
            let field = self.registry.describe_field(name)?;
            columns.push(ColumnRef {
                name: field.name,
                field_type: field.field_type,
            });
        }
        let query = RowQuery {
            columns,
            time_column: self.registry.time_field(),
            window,
            limit: self.max_rows.saturating_add(1),
        };
        let rows = self.store.fetch_rows(&scope.customer_id, &query).await?;
        debug!(store = self.store.name(), rows = rows.len(), "Fetched rows");
        if rows.len() > self.max_rows {
            return Err(QueryError::invalid(
                parameter,
                format!(
                    "'{}' matches more than {} shipments; choose a shorter range",
                    query.window.label, self.max_rows
                ),
            ));
        }
        Ok(rows)
    }
}

fn resolve_window(
    scope: &QueryScope,
    range: Option<&str>,
    default_days: i64,
    parameter: &'static str,
) -> Result<TimeWindow, QueryError> {
    match range.filter(|r| !r.trim().is_empty()) {
        Some(range) => {
            resolve_range(range, scope.as_of).map_err(|e| QueryError::invalid(parameter, e.0))
        }
        None => Ok(TimeWindow::trailing_days(default_days, scope.as_of)),
    }
}

const fn ratio_plan(
    name: &'static str,
    numerator: &'static str,
    denominator: &'static str,
) -> MetricPlan {
    MetricPlan::Ratio {
        name,
        numerator,
        denominator,
    }
}

const fn metric_name(plan: &MetricPlan) -> &'static str {
    match *plan {
        MetricPlan::Aggregate { field, .. } => field,
        MetricPlan::RowCount => SHIPMENT_COUNT_METRIC,
        MetricPlan::Ratio { name, .. } => name,
    }
}
