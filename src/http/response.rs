//! Response envelope and error translation.
//!
//! # Responsibilities
//! - Wrap subsystem results in the uniform response envelope
//! - Nest results under the caller's result key when one is given
//! - Map every pipeline error to a status code and machine-readable code
//!
//! # Design Decisions
//! - Validation and parse failures are 4xx with their own codes
//! - Dispatch timeouts are 504, distinct from every 4xx
//! - Unexpected failures are a generic 500; details only reach the logs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::Span;

use crate::auth::AuthError;
use crate::command::{ParseError, ValidationError};
use crate::dispatch::{DispatchError, SubsystemError};
use crate::observability::metrics;

/// Envelope version reported to callers.
pub const API_VERSION: &str = "v1";

const GENERIC_MESSAGE: &str = "Process failed, please try again later";

/// Any failure of the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Parse(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(e) => e.http_status(),
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Dispatch(DispatchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Dispatch(DispatchError::Subsystem(SubsystemError::Rejected {
                status,
                ..
            })) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Dispatch(DispatchError::Subsystem(SubsystemError::Unavailable(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Code and message safe to show the caller.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Parse(e) => ErrorBody::new("MALFORMED_REQUEST", e.to_string()),
            ApiError::Validation(e) => ErrorBody::new(e.code().as_str(), e.message()),
            ApiError::Auth(_) => ErrorBody::new("UNAUTHORIZED", "You are not authorized"),
            ApiError::Dispatch(DispatchError::Timeout(_)) => {
                ErrorBody::new("DISPATCH_TIMEOUT", "Request timed out, please try again")
            }
            ApiError::Dispatch(DispatchError::Subsystem(SubsystemError::Rejected {
                code,
                message,
                ..
            })) => ErrorBody::new(code.as_str(), message.as_str()),
            ApiError::Dispatch(DispatchError::Subsystem(SubsystemError::Unavailable(_))) => {
                ErrorBody::new("INTERNAL_ERROR", GENERIC_MESSAGE)
            }
        }
    }

    fn is_unexpected(&self) -> bool {
        self.status().is_server_error() && !matches!(self, ApiError::Dispatch(DispatchError::Timeout(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub id: &'static str,
    pub ver: &'static str,
    pub request_id: String,
    pub status: Status,
    #[serde(skip)]
    pub result_key: Option<&'static str>,
    #[serde(rename = "result", skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ResponseEnvelope {
    pub fn success(
        api_id: &'static str,
        request_id: impl Into<String>,
        result_key: Option<&'static str>,
        data: Value,
    ) -> Self {
        Self {
            id: api_id,
            ver: API_VERSION,
            request_id: request_id.into(),
            status: Status::Success,
            result_key,
            body: success_body(result_key, data),
            error: None,
        }
    }

    pub fn failure(api_id: &'static str, request_id: impl Into<String>, error: ErrorBody) -> Self {
        Self {
            id: api_id,
            ver: API_VERSION,
            request_id: request_id.into(),
            status: Status::Error,
            result_key: None,
            body: None,
            error: Some(error),
        }
    }
}

/// Result body: nested under `result_key` when given, otherwise the data
/// itself (objects unwrapped, scalars under `response`, null omitted).
pub fn success_body(result_key: Option<&str>, data: Value) -> Option<Map<String, Value>> {
    match (result_key, data) {
        (Some(key), data) => {
            let mut body = Map::new();
            body.insert(key.to_string(), data);
            Some(body)
        }
        (None, Value::Object(map)) => Some(map),
        (None, Value::Null) => None,
        (None, other) => {
            let mut body = Map::new();
            body.insert("response".to_string(), other);
            Some(body)
        }
    }
}

/// Turns pipeline outcomes into HTTP responses.
#[derive(Debug, Clone)]
pub struct Translator {
    span: Span,
}

impl Translator {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    pub fn translate(
        &self,
        api_id: &'static str,
        result_key: Option<&'static str>,
        request_id: &str,
        outcome: Result<Value, ApiError>,
    ) -> (StatusCode, ResponseEnvelope) {
        match outcome {
            Ok(data) => (
                StatusCode::OK,
                ResponseEnvelope::success(api_id, request_id, result_key, data),
            ),
            Err(e) => {
                let status = e.status();
                if e.is_unexpected() {
                    tracing::error!(
                        parent: &self.span,
                        api = api_id,
                        request_id = %request_id,
                        error = %e,
                        "Request failed unexpectedly"
                    );
                } else {
                    tracing::info!(
                        parent: &self.span,
                        api = api_id,
                        request_id = %request_id,
                        status = status.as_u16(),
                        error = %e,
                        "Request rejected"
                    );
                }
                (status, ResponseEnvelope::failure(api_id, request_id, e.body()))
            }
        }
    }

    pub fn respond(
        &self,
        api_id: &'static str,
        result_key: Option<&'static str>,
        request_id: &str,
        outcome: Result<Value, ApiError>,
    ) -> Response {
        let (status, envelope) = self.translate(api_id, result_key, request_id, outcome);
        metrics::record_response(api_id, status.as_u16());
        (status, Json(envelope)).into_response()
    }
}
