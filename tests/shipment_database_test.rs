// ABOUTME: Integration tests for the SQLite shipment store behind the query engine
// ABOUTME: Verifies tenant isolation, time-window bounds, null handling, deletes and demo seeding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::float_cmp)]

mod common;

use std::sync::Arc;

use chrono::Duration;
use haulsight_analytics::store::{ColumnRef, DataStore, RowQuery};
use haulsight_analytics::{
    Aggregation, AnalysisRequest, FieldType, QueryEngine, QueryScope, Scalar, SchemaRegistry,
    TimeWindow,
};
use haulsight_server::database::seed::{seed_demo_shipments, SeedOptions};
use haulsight_server::database::{ShipmentDatabase, ShipmentRecord};

fn record(carrier: &str, cost: Option<f64>, days_ago: i64) -> ShipmentRecord {
    ShipmentRecord {
        carrier_name: Some(carrier.to_owned()),
        mode: Some("LTL".to_owned()),
        status: Some("delivered".to_owned()),
        cost,
        retail: cost.map(|c| c * 1.25),
        miles: Some(400.0),
        ship_date: Some(common::as_of() - Duration::days(days_ago)),
        ..ShipmentRecord::default()
    }
}

async fn seeded_database() -> ShipmentDatabase {
    common::init_test_logging();
    let db = ShipmentDatabase::in_memory().await.unwrap();
    db.insert_shipment(common::CUSTOMER, &record("Saia", Some(300.0), 2))
        .await
        .unwrap();
    db.insert_shipment(common::CUSTOMER, &record("Saia", Some(200.0), 20))
        .await
        .unwrap();
    db.insert_shipment(common::CUSTOMER, &record("Estes Express", None, 4))
        .await
        .unwrap();
    db.insert_shipment(common::CUSTOMER, &record("Saia", Some(999.0), 200))
        .await
        .unwrap();
    db.insert_shipment(common::OTHER_CUSTOMER, &record("Saia", Some(5_000.0), 1))
        .await
        .unwrap();
    db
}

fn engine(db: ShipmentDatabase) -> QueryEngine {
    QueryEngine::new(Arc::new(SchemaRegistry::shipments()), Arc::new(db))
}

#[tokio::test]
async fn test_analysis_only_sees_own_tenant_within_window() {
    let engine = engine(seeded_database().await);

    let analysis = engine
        .analyze_metric(
            &common::scope(),
            &AnalysisRequest::new("cost", Aggregation::Sum, "carrier_name"),
        )
        .await
        .unwrap();

    assert_eq!(analysis.groups.len(), 1);
    assert_eq!(analysis.groups[0].label, "Saia");
    assert_eq!(analysis.groups[0].value, 500.0);
}

#[tokio::test]
async fn test_other_tenant_sees_only_its_rows() {
    let engine = engine(seeded_database().await);
    let scope = QueryScope::new(common::OTHER_CUSTOMER, common::as_of());

    let summary = engine.summary_stats(&scope, None).await.unwrap();

    assert_eq!(summary.shipment_count, 1);
}

#[tokio::test]
async fn test_fetch_rows_decodes_types_and_nulls() {
    let db = seeded_database().await;
    let query = RowQuery {
        columns: vec![
            ColumnRef {
                name: "carrier_name",
                field_type: FieldType::Text,
            },
            ColumnRef {
                name: "cost",
                field_type: FieldType::Number,
            },
            ColumnRef {
                name: "ship_date",
                field_type: FieldType::Date,
            },
        ],
        time_column: "ship_date",
        window: TimeWindow::between(
            "last_7_days",
            common::as_of() - Duration::days(7),
            common::as_of(),
        ),
        limit: 10,
    };

    let rows = db.fetch_rows(common::CUSTOMER, &query).await.unwrap();

    assert_eq!(rows.len(), 2);
    let estes = rows
        .iter()
        .find(|row| row["carrier_name"].as_text() == Some("Estes Express"))
        .unwrap();
    assert_eq!(estes["cost"], Scalar::Null);
    assert!(estes["ship_date"].as_timestamp().is_some());
    assert!(rows.iter().all(|row| row.len() == 3));
}

#[tokio::test]
async fn test_count_and_delete_per_customer() {
    let db = seeded_database().await;

    assert_eq!(db.count_for_customer(common::CUSTOMER).await.unwrap(), 4);
    assert_eq!(db.delete_for_customer(common::CUSTOMER).await.unwrap(), 4);
    assert_eq!(db.count_for_customer(common::CUSTOMER).await.unwrap(), 0);
    assert_eq!(db.count_for_customer(common::OTHER_CUSTOMER).await.unwrap(), 1);
}

#[tokio::test]
async fn test_demo_seed_inserts_requested_shipments() {
    common::init_test_logging();
    let db = ShipmentDatabase::in_memory().await.unwrap();
    let options = SeedOptions {
        shipments: 40,
        days: 30,
        seed: Some(11),
    };

    let written = seed_demo_shipments(&db, "demo", &options).await.unwrap();

    assert_eq!(written, 40);
    assert_eq!(db.count_for_customer("demo").await.unwrap(), 40);
    let summary = engine(db)
        .summary_stats(&QueryScope::now("demo"), Some("last_30_days"))
        .await
        .unwrap();
    assert!(summary.shipment_count > 0);
}

#[tokio::test]
async fn test_file_database_is_created_and_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haulsight.db");
    let url = format!("sqlite:{}", path.display());

    let db = ShipmentDatabase::new(&url).await.unwrap();
    db.insert_shipment("demo", &record("Saia", Some(10.0), 1))
        .await
        .unwrap();

    assert!(path.exists());
    let reopened = ShipmentDatabase::new(&url).await.unwrap();
    assert_eq!(reopened.count_for_customer("demo").await.unwrap(), 1);
}
