//! Errors raised while turning a request into a command.

use std::borrow::Cow;

use axum::http::StatusCode;
use thiserror::Error;

/// The inbound body could not be read or decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("unreadable request body: {0}")]
    Body(String),

    #[error("unreadable multipart body: {0}")]
    Multipart(String),

    #[error("invalid path parameter: {0}")]
    Path(String),
}

/// Stable machine-readable validation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequestData,
    MandatoryParameterMissing,
    InvalidParameterValue,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequestData => "INVALID_REQUEST_DATA",
            ErrorCode::MandatoryParameterMissing => "MANDATORY_PARAMETER_MISSING",
            ErrorCode::InvalidParameterValue => "INVALID_PARAMETER_VALUE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequestData
            | ErrorCode::MandatoryParameterMissing
            | ErrorCode::InvalidParameterValue => StatusCode::BAD_REQUEST,
        }
    }
}

/// A per-operation rule was not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct ValidationError {
    code: ErrorCode,
    message: Cow<'static, str>,
    status: StatusCode,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            status: code.status(),
        }
    }

    pub fn invalid_request_data() -> Self {
        Self::new(ErrorCode::InvalidRequestData, "Invalid requested data")
    }

    pub fn missing(key: &str) -> Self {
        Self::new(
            ErrorCode::MandatoryParameterMissing,
            format!("Mandatory parameter {key} is missing"),
        )
    }

    pub fn invalid_value(key: &str) -> Self {
        Self::new(
            ErrorCode::InvalidParameterValue,
            format!("Invalid value for parameter {key}"),
        )
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> StatusCode {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::missing("userId");
        assert_eq!(
            err.to_string(),
            "MANDATORY_PARAMETER_MISSING: Mandatory parameter userId is missing"
        );
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }
}
