use crate::{
    repository::{ApplicationRepository, PostRepository},
    store::Store,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Extension, Router,
};
use handlers::{applications, auth, health, posts, root};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod error;
pub mod handlers;
mod openapi;


pub use error::ApiError;
pub use openapi::openapi;

/// Front-ends allowed to call the API with credentials when none are configured.
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "https://assignment-eleven-a257a.firebaseapp.com",
    "https://assignment-eleven-a257a.web.app",
];

/// Routes and the extensions handlers read, without transport middleware.
#[must_use]
pub fn router(store: Arc<dyn Store>, auth_state: Arc<auth::AuthState>) -> Router {
    let post_repository = PostRepository::new(store.clone());
    let application_repository = ApplicationRepository::new(store.clone());

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .route("/jwt", post(auth::session::issue))
        .route("/logout", post(auth::session::logout))
        .route("/posts", get(posts::list).post(posts::create))
        .route("/posts-by-title", post(posts::search_by_title))
        .route("/posts/:email", get(posts::by_organizer))
        .route(
            "/post/:id",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/applications", post(applications::create))
        .route("/applications/:id", axum::routing::delete(applications::cancel))
        .route(
            "/application-requests/:email",
            get(applications::by_applicant),
        )
        .route(
            "/organizer-requests/:email",
            get(applications::by_organizer),
        )
        .route(
            "/application-post-details",
            get(applications::applied_post_details),
        )
        .route(
            "/application-post-details/:email",
            get(applications::applied_post_details_by_path),
        )
        .layer(
            ServiceBuilder::new()
                .layer(Extension(auth_state))
                .layer(Extension(post_repository))
                .layer(Extension(application_repository))
                .layer(Extension(store)),
        )
}

/// Full application: routes plus request ids, tracing and CORS.
///
/// # Errors
/// Returns an error if a CORS origin is not a valid URL origin.
pub fn app(
    store: Arc<dyn Store>,
    auth_state: Arc<auth::AuthState>,
    cors_origins: &[String],
) -> Result<Router> {
    let origins = cors_origins
        .iter()
        .map(|origin| allowed_origin(origin))
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true);

    Ok(router(store, auth_state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    ))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    cors_origins: &[String],
    store: Arc<dyn Store>,
    auth_config: auth::AuthConfig,
) -> Result<()> {
    let auth_state = Arc::new(auth::AuthState::new(auth_config));
    let app = app(store, auth_state, cors_origins)?;

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Reduce a configured front-end URL to its `scheme://host[:port]` origin.
fn allowed_origin(origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(origin).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .with_context(|| format!("CORS origin must include a host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
