// ABOUTME: Chart-ready visualization descriptors returned alongside answers
// ABOUTME: Bar, line, pie and stat card payloads with a display format hint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Chart kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Grouped or bucketed values
    Bar,
    /// Time series
    Line,
    /// Share of a whole
    Pie,
    /// Single headline number
    Stat,
}

/// How values should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Money
    Currency,
    /// Percentage or ratio
    Percent,
    /// Plain number
    Number,
}

/// Direction of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Value increased
    Up,
    /// Value decreased
    Down,
    /// No change
    Neutral,
}

impl Direction {
    /// Direction of a signed percent change; neutral only for exactly zero
    #[must_use]
    pub fn from_change(percent_change: f64) -> Self {
        if percent_change > 0.0 {
            Self::Up
        } else if percent_change < 0.0 {
            Self::Down
        } else {
            Self::Neutral
        }
    }
}

/// One labelled value of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Group, bucket or period label
    pub label: String,
    /// Value
    pub value: f64,
    /// Marked for attention (anomalies)
    #[serde(default)]
    pub highlighted: bool,
}

impl DataPoint {
    /// Unhighlighted point
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            highlighted: false,
        }
    }
}

/// Comparison shown under a stat card value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatComparison {
    /// Baseline value
    pub previous_value: f64,
    /// Signed percent change
    pub percent_change: f64,
    /// Direction of change
    pub direction: Direction,
}

/// Chart payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartData {
    /// Ordered labelled values
    Series {
        /// Points in display order
        points: Vec<DataPoint>,
    },
    /// Headline value
    Scalar {
        /// Current value
        value: f64,
        /// Optional comparison to a baseline
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comparison: Option<StatComparison>,
    },
}

/// Renderable chart descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    /// Identifier unique within one response
    pub id: String,
    /// Chart kind
    #[serde(rename = "type")]
    pub kind: ChartKind,
    /// Title
    pub title: String,
    /// Display format
    pub format: ValueFormat,
    /// Payload
    pub data: ChartData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_change() {
        assert_eq!(Direction::from_change(20.0), Direction::Up);
        assert_eq!(Direction::from_change(-0.5), Direction::Down);
        assert_eq!(Direction::from_change(0.0), Direction::Neutral);
    }

    #[test]
    fn test_visualization_wire_format() {
        let viz = Visualization {
            id: "viz-call_1".to_owned(),
            kind: ChartKind::Stat,
            title: "Total cost".to_owned(),
            format: ValueFormat::Currency,
            data: ChartData::Scalar {
                value: 120.0,
                comparison: None,
            },
        };
        let json = serde_json::to_value(&viz).unwrap();
        assert_eq!(json["type"], "stat");
        assert_eq!(json["format"], "currency");
        assert_eq!(json["data"]["shape"], "scalar");
        assert!(json["data"].get("comparison").is_none());
    }
}
