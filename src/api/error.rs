//! API error handling.
//!
//! Every failure leaves the service as `{"error": <message>, "code": <CODE>}`
//! with a matching status code.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 400 Bad Request response with the `VALIDATION_ERROR` code.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", message),
        )
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// Creates a 405 response naming the rejected method.
    #[must_use]
    pub fn method_not_allowed(method: &Method) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError::new("METHOD_NOT_ALLOWED", format!("Method {method} Not Allowed")),
        )
    }

    /// Creates a 500 Internal Server Error response.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        )
    }

    /// The 404 returned for an id with no active task.
    #[must_use]
    pub fn task_not_found() -> Self {
        Self::not_found("Task not found")
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<RepositoryError> for ApiErrorResponse {
    fn from(error: RepositoryError) -> Self {
        // Store details stay in the log; clients only see a generic message.
        tracing::error!(%error, "Repository operation failed");
        Self::internal_error("Internal server error")
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input rejected before any store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task name is required")]
    NameRequired,

    #[error("Task name cannot be empty")]
    NameEmpty,

    #[error("Invalid status value")]
    InvalidStatus,

    #[error("Invalid priority value")]
    InvalidPriority,

    #[error("Invalid due_date value")]
    InvalidDueDate,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Valid task ID is required")]
    InvalidTaskId,
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        Self::bad_request(error.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_api_error_serializes_error_and_code() {
        let error = ApiError::new("NOT_FOUND", "Task not found");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Task not found", "code": "NOT_FOUND"})
        );
    }

    #[rstest]
    fn test_api_error_response_bad_request() {
        let response = ApiErrorResponse::bad_request("Invalid input");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
    }

    #[rstest]
    fn test_api_error_response_not_found() {
        let response = ApiErrorResponse::task_not_found();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.error, "Task not found");
    }

    #[rstest]
    #[case(Method::PATCH, "Method PATCH Not Allowed")]
    #[case(Method::POST, "Method POST Not Allowed")]
    fn test_api_error_response_method_not_allowed(#[case] method: Method, #[case] message: &str) {
        let response = ApiErrorResponse::method_not_allowed(&method);
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.error.code, "METHOD_NOT_ALLOWED");
        assert_eq!(response.error.error, message);
    }

    #[rstest]
    #[case(RepositoryError::DatabaseError("connection refused".to_string()))]
    #[case(RepositoryError::DecodeError("bad status".to_string()))]
    fn test_repository_error_is_generic_internal_error(#[case] error: RepositoryError) {
        let response = ApiErrorResponse::from(error);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error.code, "INTERNAL_ERROR");
        assert_eq!(response.error.error, "Internal server error");
    }

    #[rstest]
    #[case(ValidationError::NameRequired, "Task name is required")]
    #[case(ValidationError::NameEmpty, "Task name cannot be empty")]
    #[case(ValidationError::InvalidStatus, "Invalid status value")]
    #[case(ValidationError::InvalidPriority, "Invalid priority value")]
    #[case(ValidationError::InvalidDueDate, "Invalid due_date value")]
    #[case(ValidationError::NoFieldsToUpdate, "No fields to update")]
    #[case(ValidationError::InvalidTaskId, "Valid task ID is required")]
    fn test_validation_error_to_api_error_response(
        #[case] error: ValidationError,
        #[case] message: &str,
    ) {
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(response.error.error, message);
    }
}
