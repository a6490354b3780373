// ABOUTME: SQLite-backed shipment store implementing the tenant-scoped DataStore contract
// ABOUTME: Creates the shipments table, inserts seed rows and serves registry-column projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Shipment Database
//!
//! Column names in every statement come from the schema registry through
//! [`RowQuery`]; values (customer id, window bounds, row limit) are always
//! bound parameters. Timestamps are stored as RFC 3339 text with a `Z` suffix so
//! lexicographic comparison matches chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use haulsight_analytics::schema::FieldType;
use haulsight_analytics::store::{ColumnRef, DataStore, RowQuery};
use haulsight_analytics::{Row, Scalar};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row as _;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Synthetic demo shipments
pub mod seed;

/// One shipment to insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentRecord {
    /// Carrier name
    pub carrier_name: Option<String>,
    /// Transport mode
    pub mode: Option<String>,
    /// Origin state
    pub origin_state: Option<String>,
    /// Destination state
    pub destination_state: Option<String>,
    /// Shipment status
    pub status: Option<String>,
    /// Amount billed
    pub retail: Option<f64>,
    /// Carrier cost
    pub cost: Option<f64>,
    /// Retail minus cost
    pub margin: Option<f64>,
    /// Lane distance
    pub miles: Option<f64>,
    /// Billed weight
    pub weight: Option<f64>,
    /// Days in transit
    pub transit_days: Option<f64>,
    /// 1.0 when on time, 0.0 when late
    pub on_time: Option<f64>,
    /// Pickup time
    pub ship_date: Option<DateTime<Utc>>,
    /// Delivery time
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Stored timestamp text
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Shipment storage over a `SQLite` pool
#[derive(Clone)]
pub struct ShipmentDatabase {
    pool: SqlitePool,
}

impl ShipmentDatabase {
    /// Connect to a database URL, creating the file if needed, and migrate
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let needs_create_mode = database_url.starts_with("sqlite:")
            && !database_url.contains("mode=")
            && !database_url.contains(":memory:");
        let connection_options = if needs_create_mode {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {database_url}: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(database_url = %database_url, "Shipment database ready");
        Ok(db)
    }

    /// Private in-memory database; one connection so every query sees the same data
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or migrated.
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Create the shipments table and its tenant/date index
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS shipments (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                carrier_name TEXT,
                mode TEXT,
                origin_state TEXT,
                destination_state TEXT,
                status TEXT,
                retail REAL,
                cost REAL,
                margin REAL,
                miles REAL,
                weight REAL,
                transit_days REAL,
                on_time REAL,
                ship_date TEXT,
                delivery_date TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create shipments table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_shipments_customer_date ON shipments(customer_id, ship_date)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create shipments index: {e}")))?;

        Ok(())
    }

    /// Insert one shipment for a customer, returning its id
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_shipment(
        &self,
        customer_id: &str,
        record: &ShipmentRecord,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r"
            INSERT INTO shipments (
                id, customer_id, carrier_name, mode, origin_state, destination_state, status,
                retail, cost, margin, miles, weight, transit_days, on_time, ship_date, delivery_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ",
        )
        .bind(&id)
        .bind(customer_id)
        .bind(&record.carrier_name)
        .bind(&record.mode)
        .bind(&record.origin_state)
        .bind(&record.destination_state)
        .bind(&record.status)
        .bind(record.retail)
        .bind(record.cost)
        .bind(record.margin)
        .bind(record.miles)
        .bind(record.weight)
        .bind(record.transit_days)
        .bind(record.on_time)
        .bind(record.ship_date.as_ref().map(timestamp_text))
        .bind(record.delivery_date.as_ref().map(timestamp_text))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert shipment: {e}")))?;

        Ok(id)
    }

    /// Shipments stored for a customer
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    pub async fn count_for_customer(&self, customer_id: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shipments WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count shipments: {e}")))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Remove every shipment for a customer, returning how many were deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_for_customer(&self, customer_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM shipments WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete shipments: {e}")))?;
        Ok(result.rows_affected())
    }

    fn decode_column(row: &SqliteRow, column: &ColumnRef) -> AppResult<Scalar> {
        let decode_error = |e: sqlx::Error| {
            AppError::database(format!("Failed to read column {}: {e}", column.name))
        };
        let value: Scalar = match column.field_type {
            FieldType::Text => row
                .try_get::<Option<String>, _>(column.name)
                .map_err(decode_error)?
                .into(),
            FieldType::Number => row
                .try_get::<Option<f64>, _>(column.name)
                .map_err(decode_error)?
                .into(),
            FieldType::Date => row
                .try_get::<Option<String>, _>(column.name)
                .map_err(decode_error)?
                .and_then(|text| DateTime::parse_from_rfc3339(&text).ok())
                .map(|ts| ts.with_timezone(&Utc))
                .into(),
        };
        Ok(value)
    }
}

#[async_trait]
impl DataStore for ShipmentDatabase {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_rows(&self, customer_id: &str, query: &RowQuery) -> AppResult<Vec<Row>> {
        let select_list = if query.columns.is_empty() {
            "1".to_owned()
        } else {
            query
                .columns
                .iter()
                .map(|column| column.name)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {select_list} FROM shipments WHERE customer_id = $1");
        let mut bounds = Vec::new();
        if let Some(start) = &query.window.start {
            bounds.push(timestamp_text(start));
            sql.push_str(&format!(" AND {} >= ${}", query.time_column, bounds.len() + 1));
        }
        if let Some(end) = &query.window.end {
            bounds.push(timestamp_text(end));
            sql.push_str(&format!(" AND {} < ${}", query.time_column, bounds.len() + 1));
        }
        sql.push_str(&format!(" LIMIT ${}", bounds.len() + 2));
        debug!(sql = %sql, customer_id = %customer_id, "Fetching shipment rows");

        let statement = bounds
            .iter()
            .fold(sqlx::query(&sql).bind(customer_id), |statement, bound| {
                statement.bind(bound)
            })
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
        let records = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch shipments: {e}")))?;

        records
            .iter()
            .map(|record| {
                query
                    .columns
                    .iter()
                    .map(|column| {
                        Ok((column.name.to_owned(), Self::decode_column(record, column)?))
                    })
                    .collect::<AppResult<Row>>()
            })
            .collect()
    }
}
