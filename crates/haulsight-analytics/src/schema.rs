// ABOUTME: Static field catalog for the shipments table with bucket and derived-metric definitions
// ABOUTME: The only source of field names used in queries; unknown names yield a typed lookup miss
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Schema Registry
//!
//! Every field name that reaches the data store comes from this catalog.
//! Lookups never fail hard: an unknown name produces an [`UnknownField`]
//! carrying close-match suggestions that the reasoning service can act on.

use std::fmt;
use std::str::FromStr;

use haulsight_core::constants::query::{FIELD_SUGGESTION_THRESHOLD, MAX_FIELD_SUGGESTIONS};
use serde::Serialize;

/// Pseudo-metric naming the shipment row itself (valid with `count`)
pub const SHIPMENT_COUNT_METRIC: &str = "shipments";

// ============================================================================
// Field Metadata
// ============================================================================

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text / categorical
    Text,
    /// Real number
    Number,
    /// Timestamp
    Date,
}

/// Grouping of fields for discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    /// Carrier attributes
    Carrier,
    /// Origin / destination
    Lane,
    /// Shipment attributes (mode, status, weight, distance)
    Shipment,
    /// Money
    Financial,
    /// Dates and durations
    Time,
}

impl FieldCategory {
    /// All categories in display order
    pub const ALL: [Self; 5] = [
        Self::Carrier,
        Self::Lane,
        Self::Shipment,
        Self::Financial,
        Self::Time,
    ];

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::Lane => "lane",
            Self::Shipment => "shipment",
            Self::Financial => "financial",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or(())
    }
}

/// Fixed numeric range: `min <= value < max`, `max = None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    /// Display label
    pub label: &'static str,
    /// Inclusive lower bound
    pub min: f64,
    /// Exclusive upper bound
    pub max: Option<f64>,
}

impl Bucket {
    /// Whether the value falls in this bucket
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value < max)
    }
}

/// Registry entry for one stored field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetadata {
    /// Column name
    pub name: &'static str,
    /// Human label
    pub label: &'static str,
    /// What the field holds
    pub description: &'static str,
    /// Storage type
    pub field_type: FieldType,
    /// Discovery category
    pub category: FieldCategory,
    /// Usable as a grouping dimension
    pub groupable: bool,
    /// Usable as an aggregated metric
    pub aggregatable: bool,
    /// Grouped through fixed buckets instead of raw values
    pub bucketable: bool,
    /// Display unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// Bucket boundaries, ordered and non-overlapping
    #[serde(skip_serializing_if = "<[Bucket]>::is_empty")]
    pub buckets: &'static [Bucket],
}

/// Ratio metric computed as `sum(numerator) / sum(denominator)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedMetricSpec {
    /// Metric name
    pub name: &'static str,
    /// Human label
    pub label: &'static str,
    /// What the ratio measures
    pub description: &'static str,
    /// Numerator field
    pub numerator: &'static str,
    /// Denominator field
    pub denominator: &'static str,
    /// Display unit
    pub unit: &'static str,
}

impl DerivedMetricSpec {
    /// Fields the ratio reads
    #[must_use]
    pub const fn required_fields(&self) -> [&'static str; 2] {
        [self.numerator, self.denominator]
    }
}

/// A metric argument resolved against the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricRef<'a> {
    /// Stored field
    Field(&'a FieldMetadata),
    /// Derived ratio
    Derived(&'a DerivedMetricSpec),
    /// Row count pseudo-metric
    ShipmentCount,
}

impl MetricRef<'_> {
    /// Name as the caller should refer to it
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Field(field) => field.name,
            Self::Derived(spec) => spec.name,
            Self::ShipmentCount => SHIPMENT_COUNT_METRIC,
        }
    }
}

/// Typed miss for a field lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownField {
    /// The name that was asked for
    pub requested: String,
    /// Closest known names, best first
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.requested)?;
        if !self.suggestions.is_empty() {
            write!(f, " (did you mean: {}?)", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Shipments Catalog
// ============================================================================

const MILES_BUCKETS: &[Bucket] = &[
    Bucket { label: "0-100 mi", min: 0.0, max: Some(100.0) },
    Bucket { label: "100-250 mi", min: 100.0, max: Some(250.0) },
    Bucket { label: "250-500 mi", min: 250.0, max: Some(500.0) },
    Bucket { label: "500-1000 mi", min: 500.0, max: Some(1000.0) },
    Bucket { label: "1000-2000 mi", min: 1000.0, max: Some(2000.0) },
    Bucket { label: "2000+ mi", min: 2000.0, max: None },
];

const WEIGHT_BUCKETS: &[Bucket] = &[
    Bucket { label: "Parcel (<150 lb)", min: 0.0, max: Some(150.0) },
    Bucket { label: "150-1,000 lb", min: 150.0, max: Some(1000.0) },
    Bucket { label: "1,000-5,000 lb", min: 1000.0, max: Some(5000.0) },
    Bucket { label: "5,000-10,000 lb", min: 5000.0, max: Some(10_000.0) },
    Bucket { label: "10,000-20,000 lb", min: 10_000.0, max: Some(20_000.0) },
    Bucket { label: "20,000+ lb", min: 20_000.0, max: None },
];

const TRANSIT_BUCKETS: &[Bucket] = &[
    Bucket { label: "Same/next day", min: 0.0, max: Some(2.0) },
    Bucket { label: "2-3 days", min: 2.0, max: Some(4.0) },
    Bucket { label: "4-5 days", min: 4.0, max: Some(6.0) },
    Bucket { label: "6-8 days", min: 6.0, max: Some(9.0) },
    Bucket { label: "9+ days", min: 9.0, max: None },
];

const fn dimension(
    name: &'static str,
    label: &'static str,
    description: &'static str,
    category: FieldCategory,
) -> FieldMetadata {
    FieldMetadata {
        name,
        label,
        description,
        field_type: FieldType::Text,
        category,
        groupable: true,
        aggregatable: false,
        bucketable: false,
        unit: None,
        buckets: &[],
    }
}

const fn measure(
    name: &'static str,
    label: &'static str,
    description: &'static str,
    category: FieldCategory,
    unit: &'static str,
    buckets: &'static [Bucket],
) -> FieldMetadata {
    FieldMetadata {
        name,
        label,
        description,
        field_type: FieldType::Number,
        category,
        groupable: !buckets.is_empty(),
        aggregatable: true,
        bucketable: !buckets.is_empty(),
        unit: Some(unit),
        buckets,
    }
}

const fn timestamp(
    name: &'static str,
    label: &'static str,
    description: &'static str,
) -> FieldMetadata {
    FieldMetadata {
        name,
        label,
        description,
        field_type: FieldType::Date,
        category: FieldCategory::Time,
        groupable: false,
        aggregatable: false,
        bucketable: false,
        unit: None,
        buckets: &[],
    }
}

fn shipment_fields() -> Vec<FieldMetadata> {
    vec![
        dimension(
            "carrier_name",
            "Carrier",
            "Carrier that moved the shipment",
            FieldCategory::Carrier,
        ),
        dimension(
            "mode",
            "Mode",
            "Transport mode (LTL, FTL, Parcel, Intermodal)",
            FieldCategory::Shipment,
        ),
        dimension(
            "status",
            "Status",
            "Shipment status (delivered, in_transit, exception)",
            FieldCategory::Shipment,
        ),
        dimension(
            "origin_state",
            "Origin state",
            "Two-letter origin state",
            FieldCategory::Lane,
        ),
        dimension(
            "destination_state",
            "Destination state",
            "Two-letter destination state",
            FieldCategory::Lane,
        ),
        measure(
            "retail",
            "Retail",
            "Amount billed to the customer",
            FieldCategory::Financial,
            "USD",
            &[],
        ),
        measure(
            "cost",
            "Cost",
            "Amount paid to the carrier",
            FieldCategory::Financial,
            "USD",
            &[],
        ),
        measure(
            "margin",
            "Margin",
            "Retail minus cost",
            FieldCategory::Financial,
            "USD",
            &[],
        ),
        measure(
            "miles",
            "Miles",
            "Lane distance",
            FieldCategory::Shipment,
            "mi",
            MILES_BUCKETS,
        ),
        measure(
            "weight",
            "Weight",
            "Billed weight",
            FieldCategory::Shipment,
            "lb",
            WEIGHT_BUCKETS,
        ),
        measure(
            "transit_days",
            "Transit days",
            "Days from pickup to delivery",
            FieldCategory::Time,
            "days",
            TRANSIT_BUCKETS,
        ),
        measure(
            "on_time",
            "On time",
            "1 when delivered by the promised date, else 0",
            FieldCategory::Time,
            "flag",
            &[],
        ),
        timestamp(
            "ship_date",
            "Ship date",
            "When the shipment was picked up",
        ),
        timestamp(
            "delivery_date",
            "Delivery date",
            "When the shipment was delivered",
        ),
    ]
}

fn shipment_derived_metrics() -> Vec<DerivedMetricSpec> {
    vec![
        DerivedMetricSpec {
            name: "cost_per_mile",
            label: "Cost per mile",
            description: "Total carrier cost divided by total miles",
            numerator: "cost",
            denominator: "miles",
            unit: "USD/mi",
        },
        DerivedMetricSpec {
            name: "revenue_per_mile",
            label: "Revenue per mile",
            description: "Total retail divided by total miles",
            numerator: "retail",
            denominator: "miles",
            unit: "USD/mi",
        },
        DerivedMetricSpec {
            name: "cost_per_pound",
            label: "Cost per pound",
            description: "Total carrier cost divided by total billed weight",
            numerator: "cost",
            denominator: "weight",
            unit: "USD/lb",
        },
        DerivedMetricSpec {
            name: "margin_rate",
            label: "Margin rate",
            description: "Total margin divided by total retail",
            numerator: "margin",
            denominator: "retail",
            unit: "ratio",
        },
    ]
}

// ============================================================================
// Registry
// ============================================================================

/// Read-only field catalog
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    fields: Vec<FieldMetadata>,
    derived: Vec<DerivedMetricSpec>,
    time_field: &'static str,
    primary_metrics: Vec<&'static str>,
    key_dimensions: Vec<&'static str>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::shipments()
    }
}

impl SchemaRegistry {
    /// Catalog of the `shipments` table
    #[must_use]
    pub fn shipments() -> Self {
        Self {
            fields: shipment_fields(),
            derived: shipment_derived_metrics(),
            time_field: "ship_date",
            primary_metrics: vec!["retail", "cost", "margin", "miles", "weight"],
            key_dimensions: vec!["carrier_name", "mode", "origin_state", "destination_state"],
        }
    }

    /// Enumerate fields, optionally restricted to one category
    #[must_use]
    pub fn list_fields(&self, category: Option<FieldCategory>) -> Vec<&FieldMetadata> {
        self.fields
            .iter()
            .filter(|field| category.map_or(true, |wanted| field.category == wanted))
            .collect()
    }

    /// Describe one field
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] with suggestions when the name is not in the catalog.
    pub fn describe_field(&self, name: &str) -> Result<&FieldMetadata, UnknownField> {
        let wanted = normalize(name);
        self.fields
            .iter()
            .find(|field| field.name == wanted)
            .ok_or_else(|| unknown_field(name, self.fields.iter().map(|f| f.name)))
    }

    /// Derived-metric catalog
    #[must_use]
    pub fn derived_metrics(&self) -> &[DerivedMetricSpec] {
        &self.derived
    }

    /// Look up one derived metric
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] with derived-metric suggestions when absent.
    pub fn derived_metric(&self, name: &str) -> Result<&DerivedMetricSpec, UnknownField> {
        let wanted = normalize(name);
        self.derived
            .iter()
            .find(|spec| spec.name == wanted)
            .ok_or_else(|| unknown_field(name, self.derived.iter().map(|d| d.name)))
    }

    /// Resolve a metric argument to a stored field, derived metric or the row count
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] when the name matches nothing; suggestions span
    /// both fields and derived metrics.
    pub fn resolve_metric(&self, name: &str) -> Result<MetricRef<'_>, UnknownField> {
        let wanted = normalize(name);
        if wanted == SHIPMENT_COUNT_METRIC {
            return Ok(MetricRef::ShipmentCount);
        }
        if let Some(field) = self.fields.iter().find(|f| f.name == wanted) {
            return Ok(MetricRef::Field(field));
        }
        if let Some(spec) = self.derived.iter().find(|d| d.name == wanted) {
            return Ok(MetricRef::Derived(spec));
        }
        let candidates = self
            .fields
            .iter()
            .filter(|f| f.aggregatable)
            .map(|f| f.name)
            .chain(self.derived.iter().map(|d| d.name));
        Err(unknown_field(name, candidates))
    }

    /// Field whose timestamp drives time windows and trends
    #[must_use]
    pub fn time_field(&self) -> &'static str {
        self.time_field
    }

    /// Metrics reported by summary statistics
    #[must_use]
    pub fn primary_metrics(&self) -> &[&'static str] {
        &self.primary_metrics
    }

    /// Dimensions whose top values summary statistics report
    #[must_use]
    pub fn key_dimensions(&self) -> &[&'static str] {
        &self.key_dimensions
    }
}

fn unknown_field<'a>(requested: &str, candidates: impl Iterator<Item = &'a str>) -> UnknownField {
    let wanted = normalize(requested);
    let mut scored: Vec<(f64, &str)> = candidates
        .map(|candidate| {
            let mut score = strsim::jaro_winkler(&wanted, candidate);
            if !wanted.is_empty() && (candidate.contains(&wanted) || wanted.contains(candidate)) {
                score = score.max(FIELD_SUGGESTION_THRESHOLD);
            }
            (score, candidate)
        })
        .filter(|(score, _)| *score >= FIELD_SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    UnknownField {
        requested: requested.to_owned(),
        suggestions: scored
            .into_iter()
            .take(MAX_FIELD_SUGGESTIONS)
            .map(|(_, name)| name.to_owned())
            .collect(),
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_ordered_and_contiguous() {
        let registry = SchemaRegistry::shipments();
        for field in registry.list_fields(None).into_iter().filter(|f| f.bucketable) {
            for pair in field.buckets.windows(2) {
                assert_eq!(pair[0].max, Some(pair[1].min), "gap in {}", field.name);
            }
            assert!(field.buckets.last().unwrap().max.is_none());
        }
    }

    #[test]
    fn test_bucket_contains_is_half_open() {
        let bucket = MILES_BUCKETS[1];
        assert!(bucket.contains(100.0));
        assert!(bucket.contains(249.9));
        assert!(!bucket.contains(250.0));
    }

    #[test]
    fn test_normalize_accepts_spaces_and_case() {
        let registry = SchemaRegistry::shipments();
        assert_eq!(registry.describe_field("Carrier Name").unwrap().name, "carrier_name");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Financial".parse::<FieldCategory>(), Ok(FieldCategory::Financial));
        assert!("weather".parse::<FieldCategory>().is_err());
    }
}
