use crate::store::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("identity must contain an email")]
    MissingEmail,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Session claims: the submitted identity plus `iat`/`exp`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub email: String,
    #[serde(flatten)]
    pub extra: Document,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// # Errors
    /// Returns [`TokenError::MissingEmail`] when `identity` has no string `email`.
    pub fn new(
        mut identity: Document,
        issued_at: i64,
        ttl_seconds: i64,
    ) -> Result<Self, TokenError> {
        let email = match identity.remove("email") {
            Some(Value::String(email)) => email,
            _ => return Err(TokenError::MissingEmail),
        };
        // registered claims are always set by the server
        identity.remove("iat");
        identity.remove("exp");

        Ok(Self {
            email,
            extra: identity,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_seconds),
        })
    }
}
