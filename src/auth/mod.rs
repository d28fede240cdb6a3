//! Caller identity resolution.
//!
//! The auth token travels in the `X-Authenticated-Userid` header. A request
//! without it is anonymous; a token that does not resolve is rejected.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::config::AuthConfig;

/// Header carrying the auth token.
pub const AUTH_TOKEN_HEADER: &str = "x-authenticated-userid";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("auth token is not valid UTF-8")]
    MalformedToken,

    #[error("auth token could not be resolved")]
    UnknownToken,
}

/// Resolves an auth token to a stable user id.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<String, AuthError>;
}

/// Token table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.tokens.clone())
    }
}

#[async_trait]
impl Authenticator for StaticTokens {
    async fn resolve(&self, token: &str) -> Result<String, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::UnknownToken)
    }
}

/// Identity of the caller for one request; `None` when anonymous.
pub async fn identify(
    authenticator: &dyn Authenticator,
    headers: &HeaderMap,
) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(AUTH_TOKEN_HEADER) else {
        return Ok(None);
    };
    let token = value.to_str().map_err(|_| AuthError::MalformedToken)?.trim();
    if token.is_empty() {
        return Ok(None);
    }
    authenticator.resolve(token).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn tokens() -> StaticTokens {
        StaticTokens::new(HashMap::from([("token-1".to_string(), "user-1".to_string())]))
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(identify(&tokens(), &headers).await, Ok(None));
    }

    #[tokio::test]
    async fn test_known_token_resolves() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("token-1"));
        assert_eq!(
            identify(&tokens(), &headers).await,
            Ok(Some("user-1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_token_fails() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("stolen"));
        assert_eq!(
            identify(&tokens(), &headers).await,
            Err(AuthError::UnknownToken)
        );
    }
}
