//! Badge class endpoints.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::command::{keys, Inbound, MultipartForm, Operation, ParseError};
use crate::http::learner::json_inbound;
use crate::http::request::RequestContext;
use crate::http::server::AppState;

/// `POST /v1/issuer/badge/create` (multipart form with the badge image)
pub async fn create_badge_class(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let inbound = match multipart {
        Ok(multipart) => MultipartForm::read(multipart).await.map(Inbound::multipart),
        Err(e) => Err(ParseError::Multipart(e.body_text())),
    };
    state
        .handle(Operation::CreateBadgeClass, None, &ctx, &headers, inbound)
        .await
}

/// `GET /v1/issuer/badge/read/{badgeId}`
pub async fn get_badge_class(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    badge_id: Result<Path<String>, PathRejection>,
) -> Response {
    let inbound = badge_inbound(badge_id);
    state
        .handle(Operation::GetBadgeClass, None, &ctx, &headers, inbound)
        .await
}

/// `POST /v1/issuer/badge/search`
pub async fn search_badge_class(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let inbound = json_inbound(body);
    state
        .handle(Operation::SearchBadgeClass, None, &ctx, &headers, inbound)
        .await
}

/// `DELETE /v1/issuer/badge/delete/{badgeId}`
pub async fn delete_badge_class(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    badge_id: Result<Path<String>, PathRejection>,
) -> Response {
    let inbound = badge_inbound(badge_id);
    state
        .handle(Operation::DeleteBadgeClass, None, &ctx, &headers, inbound)
        .await
}

fn badge_inbound(badge_id: Result<Path<String>, PathRejection>) -> Result<Inbound, ParseError> {
    badge_id
        .map(|Path(id)| Inbound::path(keys::BADGE_ID, id))
        .map_err(|e| ParseError::Path(e.body_text()))
}
