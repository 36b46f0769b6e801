use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

use super::{auth::Principal, json_object, Message};
use crate::{
    api::error::ApiError,
    repository::ApplicationRepository,
    store::{DeleteAck, Document, InsertAck},
};

#[derive(Deserialize, Debug, IntoParams)]
pub struct EmailQuery {
    /// Must equal the session email.
    email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/applications",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Application stored, one slot reserved", body = InsertAck),
        (status = 400, description = "Missing or malformed postId", body = Message),
        (status = 401, description = "Missing or invalid session", body = Message),
        (status = 404, description = "Referenced post does not exist", body = Message),
        (status = 409, description = "No volunteer slots left", body = Message)
    ),
    tag = "applications"
)]
#[instrument(skip_all, fields(applicant = %principal.email))]
pub async fn create(
    principal: Principal,
    applications: Extension<ApplicationRepository>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<InsertAck>, ApiError> {
    let application = json_object(payload)?;
    Ok(Json(applications.create(application).await?))
}

#[utoipa::path(
    get,
    path = "/application-requests/{email}",
    params(("email" = String, Path, description = "Applicant email, must match the session")),
    responses(
        (status = 200, description = "Applications submitted by the caller", body = [serde_json::Value]),
        (status = 401, description = "Missing or invalid session", body = Message),
        (status = 403, description = "Email does not match the session", body = Message)
    ),
    tag = "applications"
)]
pub async fn by_applicant(
    principal: Principal,
    applications: Extension<ApplicationRepository>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    principal.require_email(&email)?;
    Ok(Json(applications.by_applicant(&email).await?))
}

#[utoipa::path(
    get,
    path = "/organizer-requests/{email}",
    params(("email" = String, Path, description = "Organizer email, must match the session")),
    responses(
        (status = 200, description = "Applications to the caller's posts", body = [serde_json::Value]),
        (status = 401, description = "Missing or invalid session", body = Message),
        (status = 403, description = "Email does not match the session", body = Message)
    ),
    tag = "applications"
)]
pub async fn by_organizer(
    principal: Principal,
    applications: Extension<ApplicationRepository>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    principal.require_email(&email)?;
    Ok(Json(applications.by_organizer(&email).await?))
}

#[utoipa::path(
    get,
    path = "/application-post-details",
    params(EmailQuery),
    responses(
        (status = 200, description = "Posts the caller applied to", body = [serde_json::Value]),
        (status = 401, description = "Missing or invalid session", body = Message),
        (status = 403, description = "Email does not match the session", body = Message)
    ),
    tag = "applications"
)]
pub async fn applied_post_details(
    principal: Principal,
    applications: Extension<ApplicationRepository>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let email = query.email.ok_or(ApiError::Forbidden)?;
    principal.require_email(&email)?;
    Ok(Json(applications.applied_post_details(&email).await?))
}

#[utoipa::path(
    get,
    path = "/application-post-details/{email}",
    params(("email" = String, Path, description = "Applicant email, must match the session")),
    responses(
        (status = 200, description = "Posts the caller applied to", body = [serde_json::Value]),
        (status = 401, description = "Missing or invalid session", body = Message),
        (status = 403, description = "Email does not match the session", body = Message)
    ),
    tag = "applications"
)]
pub async fn applied_post_details_by_path(
    principal: Principal,
    applications: Extension<ApplicationRepository>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    principal.require_email(&email)?;
    Ok(Json(applications.applied_post_details(&email).await?))
}

#[utoipa::path(
    delete,
    path = "/applications/{id}",
    params(("id" = String, Path, description = "postId of the application to cancel")),
    responses(
        (status = 200, description = "Deletion result", body = DeleteAck),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "applications"
)]
pub async fn cancel(
    _principal: Principal,
    applications: Extension<ApplicationRepository>,
    Path(post_id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    Ok(Json(applications.cancel(&post_id).await?))
}
