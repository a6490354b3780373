// ABOUTME: Health check route handler for service monitoring
// ABOUTME: Reports service name and version for load balancers and uptime probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use haulsight_core::constants::endpoints::HEALTH_CHECK;
use haulsight_core::constants::service::{SERVICE_NAME, SERVICE_VERSION};

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes() -> axum::Router {
        use axum::{routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "ok",
                "service": SERVICE_NAME,
                "version": SERVICE_VERSION,
            }))
        }

        Router::new().route(HEALTH_CHECK, get(health_handler))
    }
}
