// ABOUTME: Route module organization for the Haulsight HTTP surface
// ABOUTME: Assembles health and investigation routes with trace, CORS and timeout layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the Haulsight server
//!
//! Each domain module contains only route definitions and thin handlers that
//! delegate to the investigation orchestrator.

/// Health check routes
pub mod health;
/// Investigation routes
pub mod investigate;

pub use health::HealthRoutes;
pub use investigate::InvestigationRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::resources::ServerResources;

/// Slack between the investigation time budget and the transport timeout, so
/// a budget-limited investigation still writes its partial response
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Configure CORS from the allowed-origin list
///
/// An empty list or `*` allows any origin; otherwise only the listed
/// origins are accepted. Unparseable entries are skipped.
#[must_use]
pub fn setup_cors(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    HeaderValue::from_str(trimmed).ok()
                }
            })
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors);
    let timeout = resources.config.request_timeout + REQUEST_TIMEOUT_GRACE;

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(InvestigationRoutes::routes(resources))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
