//! Learner endpoints: enrollment and content progress.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::command::{keys, Inbound, Operation, ParseError};
use crate::http::request::RequestContext;
use crate::http::server::AppState;

/// `POST /v1/course/enroll`
pub async fn enroll_course(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let inbound = json_inbound(body);
    state
        .handle(Operation::EnrollCourse, None, &ctx, &headers, inbound)
        .await
}

/// `GET /v1/user/courses/{uid}`
pub async fn get_enrolled_courses(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    uid: Result<Path<String>, PathRejection>,
) -> Response {
    let inbound = uid
        .map(|Path(uid)| Inbound::path(keys::USER_ID, uid))
        .map_err(|e| ParseError::Path(e.body_text()));
    state
        .handle(Operation::GetCourse, Some(keys::COURSES), &ctx, &headers, inbound)
        .await
}

/// `POST /v1/content/state/read`
pub async fn get_content_state(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let inbound = json_inbound(body);
    state
        .handle(Operation::GetContent, Some(keys::CONTENT_LIST), &ctx, &headers, inbound)
        .await
}

/// `PATCH /v1/content/state/update`
pub async fn update_content_state(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let inbound = json_inbound(body);
    state
        .handle(Operation::AddContent, None, &ctx, &headers, inbound)
        .await
}

pub(crate) fn json_inbound(body: Result<Bytes, BytesRejection>) -> Result<Inbound, ParseError> {
    body.map(Inbound::json)
        .map_err(|e| ParseError::Body(e.body_text()))
}
