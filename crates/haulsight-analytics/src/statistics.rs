// ABOUTME: Descriptive statistics for group values: mean, population std deviation, percent change
// ABOUTME: Flags anomalous groups whose value deviates more than k standard deviations from the mean
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use haulsight_core::constants::query::{
    HIGH_SENSITIVITY_SIGMA, LOW_SENSITIVITY_SIGMA, MEDIUM_SENSITIVITY_SIGMA,
};
use serde::{Deserialize, Serialize};

use crate::results::{Anomaly, AnomalyDirection, GroupValue};

/// How eagerly anomalies are flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Flag beyond 1.5σ
    High,
    /// Flag beyond 2σ
    #[default]
    Medium,
    /// Flag beyond 3σ
    Low,
}

impl Sensitivity {
    /// Sigma multiplier
    #[must_use]
    pub const fn sigma(self) -> f64 {
        match self {
            Self::High => HIGH_SENSITIVITY_SIGMA,
            Self::Medium => MEDIUM_SENSITIVITY_SIGMA,
            Self::Low => LOW_SENSITIVITY_SIGMA,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" | "normal" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "unknown sensitivity '{other}' (expected high, medium or low)"
            )),
        }
    }
}

/// Stateless statistics helpers
pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Arithmetic mean; 0 for an empty slice
    #[must_use]
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation (divides by n, not n - 1)
    #[must_use]
    pub fn population_std_dev(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = Self::mean(values);
        let variance = values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / values.len() as f64;
        variance.sqrt()
    }

    /// Signed percent change from `baseline` to `current`.
    ///
    /// A zero baseline yields 0 when the current value is also zero, and ±100
    /// otherwise, so the result is always finite.
    #[must_use]
    pub fn percent_change(current: f64, baseline: f64) -> f64 {
        if baseline == 0.0 {
            if current == 0.0 {
                0.0
            } else {
                100.0_f64.copysign(current)
            }
        } else {
            (current - baseline) / baseline.abs() * 100.0
        }
    }

    /// Groups deviating from the mean by more than `sigma` standard deviations,
    /// most extreme first. Returns `(mean, std_dev, anomalies)`.
    #[must_use]
    pub fn detect_anomalies(groups: &[GroupValue], sigma: f64) -> (f64, f64, Vec<Anomaly>) {
        let values: Vec<f64> = groups.iter().map(|g| g.value).collect();
        let mean = Self::mean(&values);
        let std_dev = Self::population_std_dev(&values);

        // All values identical
        if std_dev == 0.0 {
            return (mean, std_dev, Vec::new());
        }

        let mut anomalies: Vec<Anomaly> = groups
            .iter()
            .filter(|group| (group.value - mean).abs() > sigma * std_dev)
            .map(|group| {
                let z_score = (group.value - mean) / std_dev;
                Anomaly {
                    label: group.label.clone(),
                    value: group.value,
                    z_score,
                    direction: if z_score > 0.0 {
                        AnomalyDirection::High
                    } else {
                        AnomalyDirection::Low
                    },
                }
            })
            .collect();
        anomalies.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
        (mean, std_dev, anomalies)
    }
}
