// ABOUTME: Shipment analytics crate: schema registry, query engine and statistics
// ABOUTME: Read-only, tenant-scoped analysis over rows fetched through the DataStore trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Haulsight Analytics
//!
//! The analytic half of an investigation. The [`schema::SchemaRegistry`] is the
//! only source of field names; the [`engine::QueryEngine`] fetches
//! tenant-scoped rows through a [`store::DataStore`] and aggregates them in
//! memory.
//!
//! Every engine operation returns `Result<_, QueryError>` so that failures
//! reach the reasoning service as structured tool errors rather than
//! aborting the investigation.

/// Aggregation functions, accumulators and grouping (categorical and bucketed)
pub mod aggregation;

/// Query engine entry points and requests
pub mod engine;

/// Query error type
pub mod error;

/// Typed query results and their tabular projection
pub mod results;

/// Row and scalar value types
pub mod row;

/// Field catalog: types, capabilities, buckets and derived metrics
pub mod schema;

/// Mean, population standard deviation, percent change and anomaly flags
pub mod statistics;

/// Tenant-scoped row access contract and an in-memory implementation
pub mod store;

/// Time windows, relative range expressions and trend periods
pub mod time;

pub use aggregation::Aggregation;
pub use engine::{
    AnalysisPlan, AnalysisRequest, AnomalyRequest, ComparisonRequest, QueryEngine, QueryScope,
    TrendRequest,
};
pub use error::QueryError;
pub use row::{Row, Scalar};
pub use schema::{FieldCategory, FieldMetadata, FieldType, SchemaRegistry, UnknownField};
pub use statistics::Sensitivity;
pub use store::{DataStore, InMemoryStore, RowQuery};
pub use time::{TimeWindow, TrendPeriod};
