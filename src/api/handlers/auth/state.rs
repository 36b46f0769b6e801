//! Auth configuration and the signing state built from it.

use jsonwebtoken::{
    get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};

use super::token::{Claims, TokenError};
use crate::store::Document;

const DEFAULT_TOKEN_TTL_DAYS: u32 = 10;
const DEFAULT_COOKIE_MAX_AGE_DAYS: u32 = 365;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret: SecretString,
    token_ttl_days: u32,
    cookie_max_age_days: u32,
    production: bool,
    public_post_creation: bool,
    public_organizer_posts: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            cookie_max_age_days: DEFAULT_COOKIE_MAX_AGE_DAYS,
            production: false,
            public_post_creation: false,
            public_organizer_posts: false,
        }
    }

    #[must_use]
    pub fn with_token_ttl_days(mut self, days: u32) -> Self {
        self.token_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_cookie_max_age_days(mut self, days: u32) -> Self {
        self.cookie_max_age_days = days;
        self
    }

    /// Production cookies are `SameSite=None; Secure` for cross-site front-ends.
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_public_post_creation(mut self, public: bool) -> Self {
        self.public_post_creation = public;
        self
    }

    #[must_use]
    pub fn with_public_organizer_posts(mut self, public: bool) -> Self {
        self.public_organizer_posts = public;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        i64::from(self.token_ttl_days) * SECONDS_PER_DAY
    }

    #[must_use]
    pub fn cookie_max_age_seconds(&self) -> i64 {
        i64::from(self.cookie_max_age_days) * SECONDS_PER_DAY
    }

    #[must_use]
    pub fn production(&self) -> bool {
        self.production
    }

    #[must_use]
    pub fn public_post_creation(&self) -> bool {
        self.public_post_creation
    }

    #[must_use]
    pub fn public_organizer_posts(&self) -> bool {
        self.public_organizer_posts
    }
}

/// Signing and verification keys derived once from [`AuthConfig`].
pub struct AuthState {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let encoding = EncodingKey::from_secret(secret);
        let decoding = DecodingKey::from_secret(secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            config,
            encoding,
            decoding,
            validation,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Sign `identity` as of now.
    ///
    /// # Errors
    /// Returns [`TokenError::MissingEmail`] when `identity` has no string `email`.
    pub fn issue(&self, identity: Document) -> Result<String, TokenError> {
        let now = i64::try_from(get_current_timestamp()).unwrap_or(i64::MAX);
        self.issue_at(identity, now)
    }

    /// Sign `identity` as if issued at `issued_at` (unix seconds).
    ///
    /// # Errors
    /// Returns an error when `identity` has no string `email` or signing fails.
    pub fn issue_at(&self, identity: Document, issued_at: i64) -> Result<String, TokenError> {
        let claims = Claims::new(identity, issued_at, self.config.token_ttl_seconds())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] for tampered, malformed or expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        Ok(jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}
