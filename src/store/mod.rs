//! Document storage for the `posts` and `applications` collections.
//!
//! [`Store`] is the seam between the repositories and a backend. `MongoStore`
//! talks to MongoDB; `MemoryStore` keeps both collections in process and backs
//! the tests and `--memory-store` runs.

pub mod memory;
pub mod model;
pub mod mongo;

pub use memory::MemoryStore;
pub use model::{
    ApplicationFilter, DeleteAck, Document, InsertAck, PostFilter, SlotReservation, UpdateAck,
};
pub use mongo::MongoStore;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    #[error("cannot set field '{0}': a non-object value is in the way")]
    FieldPath(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the backend, used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// All posts ordered by ascending `deadline`, capped at `limit`.
    async fn list_posts(&self, limit: Option<u64>) -> Result<Vec<Document>, StoreError>;

    async fn find_posts(&self, filter: &PostFilter) -> Result<Vec<Document>, StoreError>;

    async fn get_post(&self, id: &ObjectId) -> Result<Option<Document>, StoreError>;

    async fn insert_post(&self, post: Document) -> Result<InsertAck, StoreError>;

    /// `$set` every field of `fields` on the post, creating it when missing.
    async fn upsert_post(&self, id: &ObjectId, fields: Document)
        -> Result<UpdateAck, StoreError>;

    async fn delete_post(&self, id: &ObjectId) -> Result<DeleteAck, StoreError>;

    /// Decrement `numberOfVolunteers` only while it is greater than zero.
    async fn reserve_slot(&self, post_id: &ObjectId) -> Result<SlotReservation, StoreError>;

    /// Give back a slot taken by [`Store::reserve_slot`].
    async fn release_slot(&self, post_id: &ObjectId) -> Result<(), StoreError>;

    async fn insert_application(&self, application: Document) -> Result<InsertAck, StoreError>;

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Document>, StoreError>;

    /// Delete the first application referencing `post_id`.
    async fn delete_application_by_post(&self, post_id: &str) -> Result<DeleteAck, StoreError>;
}
