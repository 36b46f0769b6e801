use super::{parse_id, RepositoryError};
use crate::store::{model::ID, DeleteAck, Document, InsertAck, PostFilter, Store, UpdateAck};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn Store>,
}

/// Read `limit` the way `parseInt` does: leading digits only, anything else
/// (missing, empty, negative, zero) means no cap.
///
/// A negative limit is not passed through. The Node driver would treat
/// `limit(-3)` as "3 documents in one batch"; here `-3` lists every post.
#[must_use]
pub fn parse_limit(raw: Option<&str>) -> Option<u64> {
    let digits: String = raw?
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u64>().ok().filter(|limit| *limit > 0)
}

impl PostRepository {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Posts in ascending deadline order.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list(&self, limit: Option<&str>) -> Result<Vec<Document>, RepositoryError> {
        let limit = parse_limit(limit);
        debug!("listing posts, limit: {limit:?}");
        Ok(self.store.list_posts(limit).await?)
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn search_by_title(&self, key: &str) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .store
            .find_posts(&PostFilter::TitleContains(key.to_string()))
            .await?)
    }

    /// # Errors
    /// Returns [`RepositoryError::InvalidId`] for malformed ids.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
        let id = parse_id(id)?;
        Ok(self.store.get_post(&id).await?)
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn by_organizer(&self, email: &str) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .store
            .find_posts(&PostFilter::OrganizerEmail(email.to_string()))
            .await?)
    }

    /// Store any JSON object as a new post; the store assigns `_id`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn create(&self, mut post: Document) -> Result<InsertAck, RepositoryError> {
        post.remove(ID);
        Ok(self.store.insert_post(post).await?)
    }

    /// Replace the supplied fields, inserting the post when `id` is unknown.
    ///
    /// # Errors
    /// Returns an error for malformed ids or an update without fields.
    pub async fn update(
        &self,
        id: &str,
        mut fields: Document,
    ) -> Result<UpdateAck, RepositoryError> {
        let id = parse_id(id)?;
        fields.remove(ID);
        if fields.is_empty() {
            return Err(RepositoryError::InvalidDocument(
                "update must set at least one field",
            ));
        }
        Ok(self.store.upsert_post(&id, fields).await?)
    }

    /// # Errors
    /// Returns [`RepositoryError::InvalidId`] for malformed ids.
    pub async fn delete(&self, id: &str) -> Result<DeleteAck, RepositoryError> {
        let id = parse_id(id)?;
        Ok(self.store.delete_post(&id).await?)
    }
}
