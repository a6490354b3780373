// ABOUTME: Tenant-scoped, read-only row access contract used by the query engine
// ABOUTME: Includes an in-memory store that applies the same scoping and window filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

use async_trait::async_trait;
use haulsight_core::errors::AppResult;

use crate::row::{Row, Scalar};
use crate::schema::FieldType;
use crate::time::TimeWindow;

/// A registry column to project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name, always taken from the schema registry
    pub name: &'static str,
    /// Storage type, used to decode the column
    pub field_type: FieldType,
}

/// Projection and time filter for one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    /// Columns to return
    pub columns: Vec<ColumnRef>,
    /// Timestamp column the window filters on
    pub time_column: &'static str,
    /// Half-open window on `time_column`
    pub window: TimeWindow,
    /// Most rows to return
    pub limit: usize,
}

/// Read-only access to shipment rows
///
/// Implementations must return only rows belonging to `customer_id` and only
/// the requested columns.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Fetch rows for one tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the backend query fails.
    async fn fetch_rows(&self, customer_id: &str, query: &RowQuery) -> AppResult<Vec<Row>>;
}

/// Rows held in memory, keyed by customer
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: HashMap<String, Vec<Row>>,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows for a customer
    #[must_use]
    pub fn with_rows(
        mut self,
        customer_id: impl Into<String>,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        self.rows.entry(customer_id.into()).or_default().extend(rows);
        self
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_rows(&self, customer_id: &str, query: &RowQuery) -> AppResult<Vec<Row>> {
        let Some(rows) = self.rows.get(customer_id) else {
            return Ok(Vec::new());
        };
        let bounded = query.window.start.is_some() || query.window.end.is_some();
        Ok(rows
            .iter()
            .filter(|row| {
                !bounded
                    || row
                        .get(query.time_column)
                        .and_then(Scalar::as_timestamp)
                        .is_some_and(|ts| query.window.contains(ts))
            })
            .take(query.limit)
            .map(|row| {
                query
                    .columns
                    .iter()
                    .map(|column| {
                        let value = row.get(column.name).cloned().unwrap_or(Scalar::Null);
                        (column.name.to_owned(), value)
                    })
                    .collect()
            })
            .collect())
    }
}
