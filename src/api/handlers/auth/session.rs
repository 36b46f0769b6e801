//! Session endpoints: sign the identity into the `token` cookie, and clear it.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    state::{AuthConfig, AuthState},
    token::TokenError,
};
use crate::{
    api::{
        error::ApiError,
        handlers::{json_object, Message, Success},
    },
    store::Document,
};

pub const TOKEN_COOKIE_NAME: &str = "token";

#[utoipa::path(
    post,
    path = "/jwt",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Session cookie issued", body = Success),
        (status = 400, description = "Identity payload without an email", body = Message)
    ),
    tag = "auth"
)]
pub async fn issue(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = json_object(payload)?;

    let token = auth_state.issue(identity).map_err(|err| match err {
        TokenError::MissingEmail => ApiError::BadRequest(TokenError::MissingEmail.to_string()),
        TokenError::Invalid(err) => {
            error!("Failed to sign session token: {err}");
            ApiError::Internal
        }
    })?;

    let cookie = session_cookie(auth_state.config(), &token).map_err(|err| {
        error!("Failed to build session cookie: {err}");
        ApiError::Internal
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((StatusCode::OK, headers, Json(Success { success: true })))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = Success)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Always clear the cookie, even when none was sent.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    debug!("session cookie cleared");
    (StatusCode::OK, headers, Json(Success { success: true }))
}

fn cookie_attributes(config: &AuthConfig) -> &'static str {
    if config.production() {
        "SameSite=None; Secure"
    } else {
        "SameSite=Strict"
    }
}

/// Build the `HttpOnly` session cookie.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.cookie_max_age_seconds();
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; Max-Age={max_age}; {}",
        cookie_attributes(config)
    ))
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; Max-Age=0; {}",
        cookie_attributes(config)
    ))
}

/// Read the `token` cookie from the request headers.
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == TOKEN_COOKIE_NAME && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}
