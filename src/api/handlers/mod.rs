//! Route handlers and the response bodies they share.

pub mod applications;
pub mod auth;
pub mod health;
pub mod posts;
pub mod root;

use crate::store::Document;
use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ApiError;

/// Error body: `{"message": "..."}`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Body of `/jwt` and `/logout`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

/// Unwrap a JSON object body, answering 400 instead of axum's plain-text rejection.
pub(crate) fn json_object(
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Document, ApiError> {
    payload
        .map(|Json(document)| document)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
