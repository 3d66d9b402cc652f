//! Cross-cutting HTTP policy applied once to the whole router.
//!
//! - Every response carries the same fixed CORS headers, and `OPTIONS`
//!   preflights are answered before routing.
//! - A `405` produced by routing gets the standard JSON error body. The
//!   `Allow` header set by the router is kept.

use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use super::error::ApiErrorResponse;

pub const ALLOWED_ORIGIN: &str = "*";
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
pub const MAX_AGE: &str = "86400";
const MAX_AGE_SECONDS: u64 = 86_400;

/// Preflight handling for `OPTIONS`.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::AUTHORIZATION]))
        .max_age(Duration::from_secs(MAX_AGE_SECONDS))
}

fn fixed_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Stamps the fixed CORS headers on every response, preflight included.
///
/// The values are written verbatim so clients see exactly the same header
/// text on every endpoint.
pub fn cors_headers() -> [SetResponseHeaderLayer<HeaderValue>; 4] {
    [
        fixed_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOWED_ORIGIN),
        fixed_header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        fixed_header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        fixed_header(header::ACCESS_CONTROL_MAX_AGE, MAX_AGE),
    ]
}

/// Rewrites routing-level `405` responses into the JSON error shape.
pub async fn method_not_allowed_as_json(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = ApiErrorResponse::method_not_allowed(&method).into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}
