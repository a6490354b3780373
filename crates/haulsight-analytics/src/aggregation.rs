// ABOUTME: Aggregation functions, per-group accumulators and in-memory grouping
// ABOUTME: Categorical grouping sorts and truncates; bucketed grouping keeps registry bucket order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::results::GroupValue;
use crate::row::Row;
use crate::schema::Bucket;

/// Aggregation applied to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Total
    Sum,
    /// Mean of non-null values
    #[serde(alias = "average", alias = "mean")]
    Avg,
    /// Number of rows
    Count,
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl Aggregation {
    /// Lowercase name, also used as the value column of grouped rows
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Title-case label for chart titles
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "Total",
            Self::Avg => "Average",
            Self::Count => "Count",
            Self::Min => "Minimum",
            Self::Max => "Maximum",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" | "total" => Ok(Self::Sum),
            "avg" | "average" | "mean" => Ok(Self::Avg),
            "count" => Ok(Self::Count),
            "min" | "minimum" => Ok(Self::Min),
            "max" | "maximum" => Ok(Self::Max),
            other => Err(format!(
                "unknown aggregation '{other}' (expected sum, avg, count, min or max)"
            )),
        }
    }
}

// ============================================================================
// Metric Plans and Accumulators
// ============================================================================

/// How one metric value is computed for a set of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPlan {
    /// Aggregate a stored field
    Aggregate {
        /// Field read from each row
        field: &'static str,
        /// Aggregation applied
        aggregation: Aggregation,
    },
    /// Count rows
    RowCount,
    /// `sum(numerator) / sum(denominator)`
    Ratio {
        /// Derived metric name
        name: &'static str,
        /// Numerator field
        numerator: &'static str,
        /// Denominator field
        denominator: &'static str,
    },
}

impl MetricPlan {
    /// Fields the plan reads from each row
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        match *self {
            Self::Aggregate { field, .. } => vec![field],
            Self::RowCount => Vec::new(),
            Self::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator, denominator],
        }
    }

    /// Aggregation name reported in results
    #[must_use]
    pub const fn aggregation_name(&self) -> &'static str {
        match *self {
            Self::Aggregate { aggregation, .. } => aggregation.as_str(),
            Self::RowCount => "count",
            Self::Ratio { .. } => "ratio",
        }
    }

    /// Fresh accumulator for one group
    #[must_use]
    pub fn accumulator(&self) -> MetricAccumulator {
        MetricAccumulator {
            plan: *self,
            rows: 0,
            observations: 0,
            sum: 0.0,
            denominator: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Evaluate over a whole row set; `None` when nothing contributed
    #[must_use]
    pub fn evaluate<'r>(&self, rows: impl IntoIterator<Item = &'r Row>) -> (Option<f64>, usize) {
        let mut acc = self.accumulator();
        for row in rows {
            acc.push(row);
        }
        (acc.value(), acc.rows())
    }
}

/// Running state for one group
#[derive(Debug, Clone)]
pub struct MetricAccumulator {
    plan: MetricPlan,
    rows: usize,
    observations: usize,
    sum: f64,
    denominator: f64,
    min: f64,
    max: f64,
}

impl MetricAccumulator {
    /// Add one row
    pub fn push(&mut self, row: &Row) {
        self.rows += 1;
        match self.plan {
            MetricPlan::RowCount => {}
            MetricPlan::Aggregate { field, .. } => {
                if let Some(value) = row.get(field).and_then(|v| v.as_f64()) {
                    self.observations += 1;
                    self.sum += value;
                    self.min = self.min.min(value);
                    self.max = self.max.max(value);
                }
            }
            MetricPlan::Ratio {
                numerator,
                denominator,
                ..
            } => {
                let num = row.get(numerator).and_then(|v| v.as_f64());
                let den = row.get(denominator).and_then(|v| v.as_f64());
                if let (Some(num), Some(den)) = (num, den) {
                    self.observations += 1;
                    self.sum += num;
                    self.denominator += den;
                }
            }
        }
    }

    /// Rows seen, whether or not they carried a value
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Final value; `None` when no row contributed or a ratio's denominator is zero
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self.plan {
            MetricPlan::RowCount => Some(self.rows as f64),
            MetricPlan::Aggregate { aggregation, .. } => {
                if aggregation == Aggregation::Count {
                    return Some(self.rows as f64);
                }
                if self.observations == 0 {
                    return None;
                }
                Some(match aggregation {
                    Aggregation::Sum => self.sum,
                    Aggregation::Avg => self.sum / self.observations as f64,
                    Aggregation::Min => self.min,
                    Aggregation::Max => self.max,
                    Aggregation::Count => self.rows as f64,
                })
            }
            MetricPlan::Ratio { .. } => (self.observations > 0 && self.denominator != 0.0)
                .then(|| self.sum / self.denominator),
        }
    }
}

// ============================================================================
// Grouping
// ============================================================================

/// Group rows by the string value of `field`, aggregate, sort descending and truncate.
///
/// Rows whose group value is null are excluded. Ties sort by label so the
/// output is deterministic. Returns the kept groups and the number of groups
/// before truncation.
#[must_use]
pub fn group_categorical(
    rows: &[Row],
    field: &str,
    plan: &MetricPlan,
    limit: usize,
) -> (Vec<GroupValue>, usize) {
    let mut groups: HashMap<String, MetricAccumulator> = HashMap::new();
    for row in rows {
        let Some(label) = row.get(field).and_then(|v| v.group_label()) else {
            continue;
        };
        groups
            .entry(label)
            .or_insert_with(|| plan.accumulator())
            .push(row);
    }

    let mut values: Vec<GroupValue> = groups
        .into_iter()
        .filter_map(|(label, acc)| {
            acc.value().map(|value| GroupValue {
                label,
                value,
                count: acc.rows(),
            })
        })
        .collect();
    values.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    let total = values.len();
    values.truncate(limit);
    (values, total)
}

/// Assign rows to fixed buckets of `field` and aggregate per bucket.
///
/// Each non-null value lands in exactly one bucket (`min <= v < max`); values
/// outside every bucket are excluded. Empty buckets are dropped and bucket
/// order is preserved.
#[must_use]
pub fn group_bucketed(
    rows: &[Row],
    field: &str,
    buckets: &[Bucket],
    plan: &MetricPlan,
) -> Vec<GroupValue> {
    let mut accumulators: Vec<MetricAccumulator> =
        buckets.iter().map(|_| plan.accumulator()).collect();
    for row in rows {
        let Some(value) = row.get(field).and_then(|v| v.as_f64()) else {
            continue;
        };
        if let Some(index) = buckets.iter().position(|bucket| bucket.contains(value)) {
            accumulators[index].push(row);
        }
    }

    buckets
        .iter()
        .zip(accumulators)
        .filter(|(_, acc)| acc.rows() > 0)
        .filter_map(|(bucket, acc)| {
            acc.value().map(|value| GroupValue {
                label: bucket.label.to_owned(),
                value,
                count: acc.rows(),
            })
        })
        .collect()
}
