// ABOUTME: Investigation route accepting a natural-language question for one customer
// ABOUTME: Validates the request, runs the orchestrator and cancels it if the client goes away
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use haulsight_core::constants::endpoints::INVESTIGATE;
use haulsight_core::models::{InvestigationRequest, InvestigationResponse};
use http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Investigation routes implementation
pub struct InvestigationRoutes;

impl InvestigationRoutes {
    /// Create the investigation route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(INVESTIGATE, post(Self::handle_investigate))
            .with_state(resources)
    }

    /// Handle `POST /api/investigate`
    ///
    /// Validation failures return 400 with the failure response shape. Every
    /// investigation that starts returns 200, including ones that ended in
    /// exhaustion or a reasoning-service failure.
    async fn handle_investigate(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<InvestigationRequest>, JsonRejection>,
    ) -> Response {
        let started = Instant::now();

        let request = match payload {
            Ok(Json(request)) => request,
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Unreadable investigation request");
                return Self::reject(&AppError::invalid_input(rejection.body_text()), started);
            }
        };
        let question = match request.into_question() {
            Ok(question) => question,
            Err(error) => return Self::reject(&error, started),
        };

        info!(
            customer_id = %question.customer_id(),
            question_chars = question.text().chars().count(),
            "Investigation requested"
        );

        // Dropping the handler future (client disconnect, request timeout)
        // drops the guard and cancels the investigation.
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let response = resources.orchestrator.investigate(&question, cancel).await;

        AppLogger::log_api_request(
            "POST",
            INVESTIGATE,
            StatusCode::OK.as_u16(),
            elapsed_ms(started),
        );
        (StatusCode::OK, Json(response)).into_response()
    }

    fn reject(error: &AppError, started: Instant) -> Response {
        let elapsed = elapsed_ms(started);
        AppLogger::log_api_request("POST", INVESTIGATE, StatusCode::BAD_REQUEST.as_u16(), elapsed);
        (
            StatusCode::BAD_REQUEST,
            Json(InvestigationResponse::rejected(error, elapsed)),
        )
            .into_response()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
