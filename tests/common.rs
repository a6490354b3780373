// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Provides quiet logging, a fixed clock, shipment fixtures and orchestrator builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `haulsight_server`

use std::sync::{Arc, Once};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use haulsight_analytics::{InMemoryStore, QueryEngine, QueryScope, Row, Scalar, SchemaRegistry};
use haulsight_server::config::InvestigationConfig;
use haulsight_server::investigation::InvestigationOrchestrator;
use haulsight_server::llm::ReasoningService;
use haulsight_server::tools::ToolExecutor;

/// Tenant used by fixtures
pub const CUSTOMER: &str = "cust-acme";

/// Tenant with no shipments in the fixtures
pub const OTHER_CUSTOMER: &str = "cust-globex";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fixed "now" for deterministic windows
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

/// Scope for [`CUSTOMER`] at [`as_of`]
pub fn scope() -> QueryScope {
    QueryScope::new(CUSTOMER, as_of())
}

/// One fixture shipment row
pub fn shipment(carrier: &str, cost: f64, miles: f64, days_ago: i64) -> Row {
    Row::from([
        ("carrier_name".to_owned(), Scalar::from(carrier)),
        ("mode".to_owned(), Scalar::from("LTL")),
        ("status".to_owned(), Scalar::from("delivered")),
        ("retail".to_owned(), Scalar::from(cost * 1.2)),
        ("cost".to_owned(), Scalar::from(cost)),
        ("margin".to_owned(), Scalar::from(cost * 0.2)),
        ("miles".to_owned(), Scalar::from(miles)),
        ("on_time".to_owned(), Scalar::from(1.0)),
        (
            "ship_date".to_owned(),
            Scalar::from(as_of() - ChronoDuration::days(days_ago)),
        ),
    ])
}

/// Three carriers over the last month; Old Dominion spends the most
pub fn fixture_rows() -> Vec<Row> {
    vec![
        shipment("Old Dominion", 900.0, 300.0, 3),
        shipment("Old Dominion", 700.0, 250.0, 10),
        shipment("Saia", 400.0, 200.0, 5),
        shipment("Saia", 300.0, 150.0, 12),
        shipment("XPO Logistics", 250.0, 180.0, 8),
    ]
}

/// Query engine over the fixture rows
pub fn fixture_engine() -> QueryEngine {
    let store = InMemoryStore::new().with_rows(CUSTOMER, fixture_rows());
    QueryEngine::new(Arc::new(SchemaRegistry::shipments()), Arc::new(store))
}

/// Investigation settings with a short reasoning timeout
pub fn test_investigation_config() -> InvestigationConfig {
    InvestigationConfig {
        reasoning_timeout: Duration::from_secs(5),
        ..InvestigationConfig::default()
    }
}

/// Orchestrator over the fixture rows
pub fn orchestrator_with(reasoning: Arc<dyn ReasoningService>) -> InvestigationOrchestrator {
    orchestrator_with_config(reasoning, test_investigation_config())
}

/// Orchestrator over the fixture rows with explicit settings
pub fn orchestrator_with_config(
    reasoning: Arc<dyn ReasoningService>,
    config: InvestigationConfig,
) -> InvestigationOrchestrator {
    init_test_logging();
    InvestigationOrchestrator::new(reasoning, ToolExecutor::new(fixture_engine()), config)
}
