// ABOUTME: HTTP tests for the health and investigate routes through the full router stack
// ABOUTME: Exercises validation rejections, successful investigations and CORS preflight handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used)]

mod common;
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use haulsight_server::config::{CorsConfig, InvestigationConfig, ServerConfig};
use haulsight_server::resources::ServerResources;
use haulsight_server::routes::build_router;
use helpers::axum_test::TestRequest;
use helpers::scripted_reasoning::ScriptedReasoning;
use serde_json::{json, Value};

fn router_with(reasoning: Arc<ScriptedReasoning>, config: ServerConfig) -> axum::Router {
    let investigation = InvestigationConfig {
        time_budget: config.investigation.time_budget,
        ..common::test_investigation_config()
    };
    let orchestrator = common::orchestrator_with_config(reasoning, investigation);
    build_router(Arc::new(ServerResources::new(orchestrator, Arc::new(config))))
}

fn router(reasoning: Arc<ScriptedReasoning>) -> axum::Router {
    router_with(reasoning, ServerConfig::default())
}

#[tokio::test]
async fn test_health_reports_service_and_version() {
    let app = router(Arc::new(ScriptedReasoning::answering("unused")));

    let response = TestRequest::get("/health").send(app).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "haulsight");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_customer_id_is_rejected() {
    let reasoning = Arc::new(ScriptedReasoning::answering("unused"));
    let app = router(reasoning.clone());

    let response = TestRequest::post("/api/investigate")
        .json(&json!({"question": "How many shipments last week?"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(!body["answer"].as_str().unwrap().is_empty());
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(body["metadata"]["outcome"], "rejected");
    assert_eq!(body["metadata"]["turnsUsed"], 0);
    assert_eq!(reasoning.call_count(), 0);
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let app = router(Arc::new(ScriptedReasoning::answering("unused")));

    let response = TestRequest::post("/api/investigate")
        .json(&json!({"question": "   ", "customerId": "cust-acme"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn test_malformed_json_is_rejected_with_failure_shape() {
    let app = router(Arc::new(ScriptedReasoning::answering("unused")));

    let response = TestRequest::post("/api/investigate")
        .raw_json("{\"question\": ")
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_investigation_returns_answer_and_metadata() {
    let reasoning = Arc::new(ScriptedReasoning::answering("You moved 5 shipments."));
    let app = router(reasoning.clone());

    let response = TestRequest::post("/api/investigate")
        .json(&json!({
            "question": "How many shipments did we move?",
            "customerId": "cust-acme",
            "userId": "user-7",
            "conversationHistory": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello, ask me about your shipments."}
            ],
            "preferences": {"showReasoning": true}
        }))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["answer"], "You moved 5 shipments.");
    assert_eq!(body["metadata"]["outcome"], "answered");
    assert_eq!(body["metadata"]["mode"], "quick");
    assert_eq!(body["metadata"]["classification"]["detected"], "quick");
    assert_eq!(body["metadata"]["turnsUsed"], 1);
    assert_eq!(body["followUpQuestions"].as_array().unwrap().len(), 3);
    assert_eq!(body["reasoning"][0]["type"], "routing");

    let transcript = &reasoning.requests()[0].messages;
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[1].content, "Hi");
    assert_eq!(transcript[3].content, "How many shipments did we move?");
}

#[tokio::test]
async fn test_failed_investigation_is_still_ok_status() {
    let reasoning = Arc::new(ScriptedReasoning::answering("unused").unconfigured());
    let app = router(reasoning);

    let response = TestRequest::post("/api/investigate")
        .json(&json!({"question": "How many shipments?", "customerId": "cust-acme"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["metadata"]["outcome"], "failed");
    assert!(!body["answer"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_allows_listed_origin() {
    let config = ServerConfig {
        cors: CorsConfig {
            allowed_origins: "https://ops.example.com, https://admin.example.com".to_owned(),
        },
        ..ServerConfig::default()
    };
    let app = router_with(Arc::new(ScriptedReasoning::answering("unused")), config);

    let response = TestRequest::get("/health")
        .header("origin", "https://ops.example.com")
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://ops.example.com")
    );
}

#[tokio::test]
async fn test_slow_reasoning_still_answers_before_request_timeout() {
    let reasoning =
        Arc::new(ScriptedReasoning::answering("too late").with_delay(Duration::from_secs(2)));
    let request_timeout = Duration::from_millis(300);
    let mut config = ServerConfig {
        request_timeout,
        ..ServerConfig::default()
    };
    config.investigation.time_budget = Some(request_timeout);
    let app = router_with(reasoning, config);

    let response = TestRequest::post("/api/investigate")
        .json(&json!({"question": "How many shipments last week?", "customerId": common::CUSTOMER}))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["metadata"]["outcome"], "exhausted");
    assert!(!body["answer"].as_str().unwrap().trim().is_empty());
}
