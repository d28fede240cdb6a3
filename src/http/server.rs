//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all endpoints
//! - Wire up middleware (tracing, request ID, preflight, timeout, body limit)
//! - Answer unrouted requests (unknown path, wrong method, timeout) with the envelope
//! - Run each request through identity → normalize → validate → dispatch
//! - Translate every outcome into the response envelope
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::body::HttpBody;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{identify, Authenticator};
use crate::command::{validate, Inbound, Normalizer, Operation, ParseError};
use crate::config::GatewayConfig;
use crate::dispatch::{Dispatcher, ProcessingSubsystem};
use crate::http::request::RequestContext;
use crate::http::response::{ApiError, ErrorBody, ResponseEnvelope, Translator};
use crate::http::{badge, learner, preflight};
use crate::lifecycle::shutdown::shutdown_signal;

/// Application state injected into handlers.
///
/// Every field is immutable after startup and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Normalizer,
    pub dispatcher: Dispatcher,
    pub translator: Translator,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        config: &GatewayConfig,
        subsystem: Arc<dyn ProcessingSubsystem>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(
                config.dispatch.environment,
                tracing::info_span!("normalizer"),
            ),
            dispatcher: Dispatcher::new(
                subsystem,
                Duration::from_secs(config.dispatch.wait_secs),
                tracing::info_span!("dispatcher"),
            ),
            translator: Translator::new(tracing::info_span!("translator")),
            authenticator,
        }
    }

    /// Run one request through the pipeline.
    pub async fn execute(
        &self,
        operation: Operation,
        ctx: &RequestContext,
        headers: &HeaderMap,
        inbound: Result<Inbound, ParseError>,
    ) -> Result<Value, ApiError> {
        let inbound = inbound?;
        let requester_id = identify(self.authenticator.as_ref(), headers).await?;
        let command = self
            .normalizer
            .normalize(operation, inbound, requester_id, &ctx.request_id)?;
        let command = validate(command)?;
        Ok(self.dispatcher.dispatch(command, &ctx.request_id).await?)
    }

    /// Run the pipeline and translate the outcome.
    pub async fn handle(
        &self,
        operation: Operation,
        result_key: Option<&'static str>,
        ctx: &RequestContext,
        headers: &HeaderMap,
        inbound: Result<Inbound, ParseError>,
    ) -> Response {
        let outcome = self.execute(operation, ctx, headers, inbound).await;
        self.translator
            .respond(operation.api_id(), result_key, &ctx.request_id, outcome)
    }
}

/// HTTP server for the learner gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and collaborators.
    pub fn new(
        config: GatewayConfig,
        subsystem: Arc<dyn ProcessingSubsystem>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let state = AppState::new(&config, subsystem, authenticator);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/v1/course/enroll", post(learner::enroll_course))
            .route("/v1/user/courses/{uid}", get(learner::get_enrolled_courses))
            .route("/v1/content/state/read", post(learner::get_content_state))
            .route("/v1/content/state/update", patch(learner::update_content_state))
            .route("/v1/issuer/badge/create", post(badge::create_badge_class))
            .route("/v1/issuer/badge/read/{badge_id}", get(badge::get_badge_class))
            .route("/v1/issuer/badge/search", post(badge::search_badge_class))
            .route("/v1/issuer/badge/delete/{badge_id}", delete(badge::delete_badge_class))
            .route("/health", get(health))
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.limits.request_secs),
            ))
            .layer(middleware::from_fn(request_timeout_envelope))
            .layer(middleware::from_fn(preflight::preflight_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or Ctrl+C is received.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            wait_secs = self.config.dispatch.wait_secs,
            environment = ?self.config.dispatch.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct HealthStatus {
    version: &'static str,
    status: &'static str,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Failure envelope for a request that never reached an operation.
fn unrouted(status: StatusCode, request_id: String, code: &str, message: &str) -> Response {
    let envelope =
        ResponseEnvelope::failure("api.unknown", request_id, ErrorBody::new(code, message));
    (status, Json(envelope)).into_response()
}

async fn not_found(ctx: RequestContext) -> Response {
    unrouted(
        StatusCode::NOT_FOUND,
        ctx.request_id,
        "RESOURCE_NOT_FOUND",
        "Requested resource does not exist",
    )
}

async fn method_not_allowed(ctx: RequestContext) -> Response {
    unrouted(
        StatusCode::METHOD_NOT_ALLOWED,
        ctx.request_id,
        "METHOD_NOT_ALLOWED",
        "Method is not supported for this resource",
    )
}

/// Replaces the timeout layer's bodiless 408 with the envelope.
async fn request_timeout_envelope(ctx: RequestContext, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let bodiless = response.body().size_hint().exact() == Some(0);
    if response.status() == StatusCode::REQUEST_TIMEOUT && bodiless {
        tracing::warn!(request_id = %ctx.request_id, "Request exceeded the request deadline");
        return unrouted(
            StatusCode::REQUEST_TIMEOUT,
            ctx.request_id,
            "REQUEST_TIMEOUT",
            "Request took too long to arrive",
        );
    }
    response
}
