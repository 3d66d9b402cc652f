//! Common test helpers for integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::create_test_app;
//! ```
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use todo_task_api::api::{AppState, build_router};
use todo_task_api::infrastructure::InMemoryTaskRepository;

// =============================================================================
// Test Application
// =============================================================================

/// Router plus a handle on the repository behind it, so tests can inspect
/// rows the API no longer exposes.
pub struct TestApp {
    pub router: Router,
    pub repository: InMemoryTaskRepository,
}

/// Decoded response: status, headers and the JSON body (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Creates a router backed by a fresh in-memory repository.
pub fn create_test_app() -> TestApp {
    let repository = InMemoryTaskRepository::new();
    let state = AppState::new(Arc::new(repository.clone()));
    TestApp {
        router: build_router(state),
        repository,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a task through the API and returns its JSON representation.
    pub async fn create_task(&self, body: Value) -> Value {
        let response = self.post("/tasks", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["task"].clone()
    }

    pub async fn create_named(&self, name: &str) -> Value {
        self.create_task(json!({ "name": name })).await
    }
}

/// Extracts the numeric id from a task JSON object.
pub fn task_id(task: &Value) -> i64 {
    task["id"].as_i64().expect("task id is an integer")
}

/// Names of the tasks in a list or export body, in response order.
pub fn task_names(body: &Value) -> Vec<String> {
    body["tasks"]
        .as_array()
        .expect("tasks is an array")
        .iter()
        .map(|task| task["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
