//! Authenticated principal extraction and the email-match guard.
//!
//! Flow: read the `token` cookie, verify signature and expiry, and hand the
//! decoded identity to the handler. Any failure ends the request with 401
//! before the handler body runs.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tracing::{debug, error};

use super::{session::extract_token, state::AuthState, token::Claims};
use crate::api::error::ApiError;

/// Identity decoded from a valid session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub email: String,
    pub claims: Claims,
}

impl Principal {
    /// Email-scoped lookups only serve the caller's own data.
    ///
    /// # Errors
    /// Returns [`ApiError::Forbidden`] when `email` is not the session email.
    pub fn require_email(&self, email: &str) -> Result<(), ApiError> {
        if self.email == email {
            Ok(())
        } else {
            debug!("email mismatch for {}", self.email);
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_state) = parts.extensions.get::<Arc<AuthState>>().cloned() else {
            error!("AuthState extension missing from router");
            return Err(ApiError::Internal);
        };

        let token = extract_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let claims = auth_state.verify(&token).map_err(|err| {
            debug!("rejected session token: {err}");
            ApiError::Unauthorized
        })?;

        Ok(Self {
            email: claims.email.clone(),
            claims,
        })
    }
}
