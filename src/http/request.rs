//! Per-request context.
//!
//! # Responsibilities
//! - Expose the request ID assigned by the request-id middleware
//! - Fall back to a fresh UUID when the middleware is absent
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The context lives for one request only

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Context derived from one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self { request_id })
    }
}
