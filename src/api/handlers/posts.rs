use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use super::{
    auth::{AuthState, Principal},
    json_object, Message,
};
use crate::{
    api::error::ApiError,
    repository::PostRepository,
    store::{DeleteAck, Document, InsertAck, UpdateAck},
};

#[derive(Deserialize, Debug, IntoParams)]
pub struct ListQuery {
    /// Positive integer cap; anything else lists every post.
    limit: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TitleSearch {
    key: String,
}

/// Let the request through without a session when `public` is set.
fn allow(principal: Result<Principal, ApiError>, public: bool) -> Result<(), ApiError> {
    match principal {
        Ok(_) => Ok(()),
        Err(_) if public => Ok(()),
        Err(err) => Err(err),
    }
}

#[utoipa::path(
    get,
    path = "/posts",
    params(ListQuery),
    responses(
        (status = 200, description = "Posts by ascending deadline", body = [serde_json::Value])
    ),
    tag = "posts"
)]
pub async fn list(
    posts: Extension<PostRepository>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(posts.list(query.limit.as_deref()).await?))
}

#[utoipa::path(
    post,
    path = "/posts",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Post stored", body = InsertAck),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "posts"
)]
pub async fn create(
    principal: Result<Principal, ApiError>,
    auth_state: Extension<Arc<AuthState>>,
    posts: Extension<PostRepository>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<InsertAck>, ApiError> {
    allow(principal, auth_state.config().public_post_creation())?;
    let post = json_object(payload)?;
    Ok(Json(posts.create(post).await?))
}

#[utoipa::path(
    post,
    path = "/posts-by-title",
    request_body = TitleSearch,
    responses(
        (status = 200, description = "Posts whose title contains the key", body = [serde_json::Value]),
        (status = 400, description = "Missing key", body = Message)
    ),
    tag = "posts"
)]
pub async fn search_by_title(
    posts: Extension<PostRepository>,
    payload: Result<Json<TitleSearch>, JsonRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let Json(search) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    debug!("title search: {}", search.key);
    Ok(Json(posts.search_by_title(&search.key).await?))
}

#[utoipa::path(
    get,
    path = "/post/{id}",
    params(("id" = String, Path, description = "Post ObjectId")),
    responses(
        (status = 200, description = "The post, or null when absent", body = serde_json::Value),
        (status = 400, description = "Malformed id", body = Message),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "posts"
)]
pub async fn get(
    _principal: Principal,
    posts: Extension<PostRepository>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    Ok(Json(posts.get(&id).await?))
}

#[utoipa::path(
    get,
    path = "/posts/{email}",
    params(("email" = String, Path, description = "Organizer email")),
    responses(
        (status = 200, description = "Posts of the organizer", body = [serde_json::Value]),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "posts"
)]
pub async fn by_organizer(
    principal: Result<Principal, ApiError>,
    auth_state: Extension<Arc<AuthState>>,
    posts: Extension<PostRepository>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    allow(principal, auth_state.config().public_organizer_posts())?;
    Ok(Json(posts.by_organizer(&email).await?))
}

#[utoipa::path(
    put,
    path = "/post/{id}",
    params(("id" = String, Path, description = "Post ObjectId")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Fields set, post created when missing", body = UpdateAck),
        (status = 400, description = "Malformed id or empty update", body = Message),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "posts"
)]
pub async fn update(
    _principal: Principal,
    posts: Extension<PostRepository>,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<UpdateAck>, ApiError> {
    let fields = json_object(payload)?;
    Ok(Json(posts.update(&id, fields).await?))
}

#[utoipa::path(
    delete,
    path = "/post/{id}",
    params(("id" = String, Path, description = "Post ObjectId")),
    responses(
        (status = 200, description = "Deletion result", body = DeleteAck),
        (status = 400, description = "Malformed id", body = Message),
        (status = 401, description = "Missing or invalid session", body = Message)
    ),
    tag = "posts"
)]
pub async fn delete(
    _principal: Principal,
    posts: Extension<PostRepository>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    Ok(Json(posts.delete(&id).await?))
}
