//! Remote processing subsystem reached over HTTP.
//!
//! # Responsibilities
//! - POST each command as JSON to `{url}/v1/commands/{operation}`
//! - Unwrap the `result` field of successful replies; an empty reply is null
//! - Turn `{code, message}` error bodies into business rejections
//!
//! # Design Decisions
//! - No retries; the dispatcher owns the deadline
//! - Transport failures are `Unavailable`, never `Rejected`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::command::Command;
use crate::config::SubsystemConfig;
use crate::dispatch::subsystem::{ProcessingSubsystem, SubsystemError, SubsystemResult};

/// Error body returned by the processing service.
#[derive(Debug, Deserialize)]
struct Rejection {
    code: String,
    message: String,
}

/// HTTP client for a remote processing subsystem.
#[derive(Debug, Clone)]
pub struct HttpSubsystem {
    client: reqwest::Client,
    base: Url,
}

impl HttpSubsystem {
    pub fn new(config: &SubsystemConfig) -> Result<Self, SubsystemError> {
        let mut base: Url = config.url.parse().map_err(|e| {
            SubsystemError::Unavailable(format!("invalid subsystem URL '{}': {}", config.url, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SubsystemError::Unavailable(e.to_string()))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, command: &Command) -> Result<Url, SubsystemError> {
        self.base
            .join(&format!("v1/commands/{}", command.operation))
            .map_err(|e| SubsystemError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl ProcessingSubsystem for HttpSubsystem {
    async fn send(&self, command: Command) -> SubsystemResult {
        let url = self.endpoint(&command)?;
        let mut request = self.client.post(url.clone()).json(&command);
        if let Some(request_id) = &command.request_id {
            request = request.header("x-request-id", request_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubsystemError::Unavailable(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SubsystemError::Unavailable(e.to_string()))?;

        if status.is_success() {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            let value: Value = serde_json::from_slice(&body).map_err(|_| {
                SubsystemError::Unavailable(format!("non-JSON reply from {url}"))
            })?;
            return Ok(match value {
                Value::Object(mut map) => match map.remove("result") {
                    Some(result) => result,
                    None => Value::Object(map),
                },
                other => other,
            });
        }

        match serde_json::from_slice::<Rejection>(&body) {
            Ok(rejection) => Err(SubsystemError::rejected(
                rejection.code,
                rejection.message,
                status.as_u16(),
            )),
            Err(_) => Err(SubsystemError::Unavailable(format!(
                "{url} answered {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Environment, Operation, Payload};

    fn config(url: &str) -> SubsystemConfig {
        SubsystemConfig {
            url: url.to_string(),
            connect_timeout_secs: 1,
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpSubsystem::new(&config("http://processing:9000/api")).unwrap();
        let command = Command::new(Operation::EnrollCourse, Environment::Dev, Payload::new());
        assert_eq!(
            client.endpoint(&command).unwrap().as_str(),
            "http://processing:9000/api/v1/commands/enrollCourse"
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpSubsystem::new(&config("not a url")).unwrap_err();
        assert!(err.to_string().contains("invalid subsystem URL"));
    }

    /// Serve canned replies per operation on an ephemeral port.
    async fn start_processing_service() -> String {
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::json;

        let app = Router::new()
            .route(
                "/v1/commands/getCourse",
                post(|| async { Json(json!({ "result": { "courses": ["do_1"] }, "ts": 1 })) }),
            )
            .route(
                "/v1/commands/searchBadgeClass",
                post(|| async { Json(json!({ "count": 2 })) }),
            )
            .route(
                "/v1/commands/getBadgeClass",
                post(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "code": "RESOURCE_NOT_FOUND", "message": "badge not found" })),
                    )
                }),
            )
            .route(
                "/v1/commands/enrollCourse",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
            )
            .route(
                "/v1/commands/deleteBadgeClass",
                post(|| async { StatusCode::NO_CONTENT }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    async fn send(url: &str, operation: Operation) -> SubsystemResult {
        let client = HttpSubsystem::new(&config(url)).unwrap();
        client
            .send(Command::new(operation, Environment::Dev, Payload::new()))
            .await
    }

    #[tokio::test]
    async fn test_success_reply_unwraps_result() {
        let url = start_processing_service().await;
        let value = send(&url, Operation::GetCourse).await.unwrap();
        assert_eq!(value, serde_json::json!({ "courses": ["do_1"] }));
    }

    #[tokio::test]
    async fn test_success_reply_without_result_is_whole_body() {
        let url = start_processing_service().await;
        let value = send(&url, Operation::SearchBadgeClass).await.unwrap();
        assert_eq!(value, serde_json::json!({ "count": 2 }));
    }

    #[tokio::test]
    async fn test_empty_success_reply_is_null() {
        let url = start_processing_service().await;
        let value = send(&url, Operation::DeleteBadgeClass).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_error_body_becomes_rejection() {
        let url = start_processing_service().await;
        let err = send(&url, Operation::GetBadgeClass).await.unwrap_err();
        assert_eq!(
            err,
            SubsystemError::rejected("RESOURCE_NOT_FOUND", "badge not found", 404)
        );
    }

    #[tokio::test]
    async fn test_unstructured_error_is_unavailable() {
        let url = start_processing_service().await;
        let err = send(&url, Operation::EnrollCourse).await.unwrap_err();
        assert!(matches!(err, SubsystemError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        let client = HttpSubsystem::new(&config("http://127.0.0.1:1")).unwrap();
        let command = Command::new(Operation::GetCourse, Environment::Dev, Payload::new());
        let err = client.send(command).await.unwrap_err();
        assert!(matches!(err, SubsystemError::Unavailable(_)));
    }
}
