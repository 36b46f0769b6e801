//! Post and application repositories.
//!
//! Both are plain values wrapping an injected [`Store`]; the router hands them
//! to handlers through `axum::Extension`.

pub mod applications;
pub mod posts;

pub use applications::ApplicationRepository;
pub use posts::PostRepository;

use crate::store::StoreError;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid id")]
    InvalidId(String),
    #[error("{0}")]
    InvalidDocument(&'static str),
    #[error("post not found")]
    PostNotFound,
    #[error("no volunteer slots left")]
    NoSlotsLeft,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse a 24-hex `ObjectId` as used in `_id` and `postId`.
///
/// # Errors
/// Returns [`RepositoryError::InvalidId`] for anything else.
pub fn parse_id(id: &str) -> Result<ObjectId, RepositoryError> {
    ObjectId::parse_str(id.trim()).map_err(|_| RepositoryError::InvalidId(id.to_string()))
}
