//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod detail;
pub mod docs;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
#[cfg(test)]
mod testing;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use detail::{delete_task, get_task, update_task};
pub use docs::{api_document, swagger_document};
pub use dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
pub use error::{ApiError, ApiErrorResponse, ValidationError};
pub use handlers::{AppState, HealthResponse, create_task, health_check};
pub use query::{export_tasks, list_tasks};

/// Builds the application router with every route and the shared HTTP
/// policy layers.
///
/// Layer order, outermost first: fixed CORS headers, CORS preflight,
/// request tracing, 405 rewriting.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/swagger.json", get(swagger_document))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/export", get(export_tasks))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .layer(axum::middleware::from_fn(
            middleware::method_not_allowed_as_json,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer());

    middleware::cors_headers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer))
        .with_state(state)
}
