// ABOUTME: Axum HTTP testing utilities for route integration tests
// ABOUTME: Sends one request through a router with tower's oneshot and buffers the response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header::CONTENT_TYPE, request, response, Method, Request};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// Request against a router, built fluently
pub struct TestRequest {
    builder: request::Builder,
    body: Body,
}

impl TestRequest {
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    fn new(method: Method, uri: &str) -> Self {
        Self {
            builder: Request::builder().method(method).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    pub fn json(self, data: &Value) -> Self {
        self.raw_json(&data.to_string())
    }

    /// Body sent as-is with a JSON content type, for malformed payloads
    pub fn raw_json(mut self, body: &str) -> Self {
        self.body = Body::from(body.to_owned());
        self.builder = self.builder.header(CONTENT_TYPE, "application/json");
        self
    }

    pub async fn send(self, app: Router) -> TestResponse {
        let request = self.builder.body(self.body).unwrap();
        let (parts, body) = app.oneshot(request).await.unwrap().into_parts();
        TestResponse {
            parts,
            body: to_bytes(body, usize::MAX).await.unwrap(),
        }
    }
}

/// Buffered response
pub struct TestResponse {
    parts: response::Parts,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> u16 {
        self.parts.status.as_u16()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}
