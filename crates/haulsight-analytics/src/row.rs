// ABOUTME: Row and scalar value types exchanged between the data store and the engine
// ABOUTME: A row maps registry field names to nullable number, text or timestamp scalars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tabular row keyed by field name
pub type Row = BTreeMap<String, Scalar>;

/// Nullable scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Missing value
    Null,
    /// Numeric value
    Number(f64),
    /// Point in time
    Timestamp(DateTime<Utc>),
    /// Free text
    Text(String),
}

impl Scalar {
    /// Numeric value, if this is a finite number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Timestamp value
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String rendering used as a categorical group key; `None` for null.
    #[must_use]
    pub fn group_label(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
            Self::Number(value) => Some(format_number(*value)),
            Self::Timestamp(ts) => Some(ts.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Render integral values without a trailing `.0`
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_label_rendering() {
        assert_eq!(Scalar::from("  FedEx ").group_label().as_deref(), Some("FedEx"));
        assert_eq!(Scalar::from(3.0).group_label().as_deref(), Some("3"));
        assert_eq!(Scalar::from(2.5).group_label().as_deref(), Some("2.5"));
        assert_eq!(Scalar::Null.group_label(), None);
        assert_eq!(Scalar::from("").group_label(), None);
    }

    #[test]
    fn test_non_finite_numbers_are_not_numeric() {
        assert_eq!(Scalar::Number(f64::NAN).as_f64(), None);
        assert_eq!(Scalar::from(Option::<f64>::None), Scalar::Null);
    }
}
