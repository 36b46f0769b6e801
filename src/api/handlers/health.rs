use crate::{store::Store, GIT_COMMIT_HASH};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Database is reachable", body = Health),
        (status = 503, description = "Database is unreachable", body = Health)
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, store: Extension<Arc<dyn Store>>) -> impl IntoResponse {
    let ping_span = info_span!("db.ping", db.system = "mongodb", db.operation = "PING");
    let result = store.0.ping().instrument(ping_span).await.map_err(|err| {
        error!("Failed to ping database: {}", err);
        StatusCode::SERVICE_UNAVAILABLE
    });

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    match result {
        Ok(()) => (StatusCode::OK, headers, body),
        Err(status) => (status, headers, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        ApplicationFilter, DeleteAck, Document, InsertAck, MemoryStore, PostFilter,
        SlotReservation, StoreError, UpdateAck,
    };
    use async_trait::async_trait;
    use axum::{body::to_bytes, http::Request, routing::get, Router};
    use mongodb::bson::oid::ObjectId;
    use tower::ServiceExt;

    struct Unreachable;

    fn offline() -> StoreError {
        StoreError::Mongo(std::io::Error::other("offline").into())
    }

    #[async_trait]
    impl Store for Unreachable {
        async fn ping(&self) -> Result<(), StoreError> {
            Err(offline())
        }
        async fn list_posts(&self, _: Option<u64>) -> Result<Vec<Document>, StoreError> {
            Err(offline())
        }
        async fn find_posts(&self, _: &PostFilter) -> Result<Vec<Document>, StoreError> {
            Err(offline())
        }
        async fn get_post(&self, _: &ObjectId) -> Result<Option<Document>, StoreError> {
            Err(offline())
        }
        async fn insert_post(&self, _: Document) -> Result<InsertAck, StoreError> {
            Err(offline())
        }
        async fn upsert_post(&self, _: &ObjectId, _: Document) -> Result<UpdateAck, StoreError> {
            Err(offline())
        }
        async fn delete_post(&self, _: &ObjectId) -> Result<DeleteAck, StoreError> {
            Err(offline())
        }
        async fn reserve_slot(&self, _: &ObjectId) -> Result<SlotReservation, StoreError> {
            Err(offline())
        }
        async fn release_slot(&self, _: &ObjectId) -> Result<(), StoreError> {
            Err(offline())
        }
        async fn insert_application(&self, _: Document) -> Result<InsertAck, StoreError> {
            Err(offline())
        }
        async fn find_applications(
            &self,
            _: &ApplicationFilter,
        ) -> Result<Vec<Document>, StoreError> {
            Err(offline())
        }
        async fn delete_application_by_post(&self, _: &str) -> Result<DeleteAck, StoreError> {
            Err(offline())
        }
    }

    fn app(store: Arc<dyn Store>) -> Router {
        Router::new()
            .route("/health", get(health).options(health))
            .layer(Extension(store))
    }

    #[tokio::test]
    async fn test_health_reports_database_ok() -> anyhow::Result<()> {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let x_app = response
            .headers()
            .get("X-App")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(x_app.starts_with(&format!(
            "{}:{}:",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )));

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let payload: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(payload["database"], "ok");
        assert_eq!(payload["name"], env!("CARGO_PKG_NAME"));
        Ok(())
    }

    #[tokio::test]
    async fn test_health_unavailable_without_database() -> anyhow::Result<()> {
        let response = app(Arc::new(Unreachable))
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let payload: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(payload["database"], "error");
        Ok(())
    }

    #[tokio::test]
    async fn test_health_options_has_empty_body() -> anyhow::Result<()> {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/health")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert!(body.is_empty());
        Ok(())
    }
}
