use crate::repository::RepositoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use super::handlers::Message;

/// Every non-2xx response leaves through here as `{"message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Conflict(String),
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) | Self::Conflict(message) => {
                message
            }
            Self::Unauthorized => "unauthorized access",
            Self::Forbidden => "forbidden access",
            Self::Internal => "internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(Message::new(self.message()));
        (self.status(), body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidId(_) | RepositoryError::InvalidDocument(_) => {
                Self::BadRequest(err.to_string())
            }
            RepositoryError::PostNotFound => Self::NotFound(err.to_string()),
            RepositoryError::NoSlotsLeft => Self::Conflict(err.to_string()),
            RepositoryError::Store(store_err) => {
                error!("Store operation failed: {store_err}");
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn auth_failures_use_fixed_messages() -> anyhow::Result<()> {
        let (status, body) = body_of(ApiError::Unauthorized).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "message": "unauthorized access" }));

        let (status, body) = body_of(ApiError::Forbidden).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, serde_json::json!({ "message": "forbidden access" }));
        Ok(())
    }

    #[test]
    fn repository_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(RepositoryError::InvalidId("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RepositoryError::PostNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RepositoryError::NoSlotsLeft).status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn slot_conflict_keeps_repository_message() -> anyhow::Result<()> {
        let (_, body) = body_of(RepositoryError::NoSlotsLeft.into()).await?;
        assert_eq!(body["message"], "no volunteer slots left");
        Ok(())
    }
}
