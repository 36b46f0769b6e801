use super::{parse_id, RepositoryError};
use crate::store::{
    model::{ID, POST_ID},
    ApplicationFilter, DeleteAck, Document, InsertAck, PostFilter, SlotReservation, Store,
};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct ApplicationRepository {
    store: Arc<dyn Store>,
}

impl ApplicationRepository {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reserve a slot on the referenced post, then store the application.
    ///
    /// The slot is taken first with a conditional decrement, so a full post
    /// never receives the application. If the insert fails afterwards the
    /// slot is handed back.
    ///
    /// # Errors
    /// Returns an error when `postId` is missing or malformed, the post does
    /// not exist, or it has no slots left.
    #[instrument(skip_all)]
    pub async fn create(&self, mut application: Document) -> Result<InsertAck, RepositoryError> {
        let post_id = application
            .get(POST_ID)
            .and_then(Value::as_str)
            .ok_or(RepositoryError::InvalidDocument("postId is required"))
            .and_then(parse_id)?;

        match self.store.reserve_slot(&post_id).await? {
            SlotReservation::Reserved => {}
            SlotReservation::Full => return Err(RepositoryError::NoSlotsLeft),
            SlotReservation::MissingPost => return Err(RepositoryError::PostNotFound),
        }

        application.remove(ID);
        match self.store.insert_application(application).await {
            Ok(ack) => {
                info!("application {} stored for post {post_id}", ack.inserted_id);
                Ok(ack)
            }
            Err(err) => {
                if let Err(release_err) = self.store.release_slot(&post_id).await {
                    error!("Failed to release slot on post {post_id}: {release_err}");
                }
                Err(err.into())
            }
        }
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn by_applicant(&self, email: &str) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .store
            .find_applications(&ApplicationFilter::Applicant(email.to_string()))
            .await?)
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn by_organizer(&self, email: &str) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .store
            .find_applications(&ApplicationFilter::Organizer(email.to_string()))
            .await?)
    }

    /// Posts the volunteer applied to: applications for `email`, then the
    /// posts their `postId`s point at. Unparseable `postId`s are skipped.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn applied_post_details(
        &self,
        email: &str,
    ) -> Result<Vec<Document>, RepositoryError> {
        let applications = self.by_applicant(email).await?;

        let mut ids: Vec<ObjectId> = applications
            .iter()
            .filter_map(|application| application.get(POST_ID).and_then(Value::as_str))
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.store.find_posts(&PostFilter::Ids(ids)).await?)
    }

    /// Delete one application referencing `post_id`. The post's slot is not
    /// given back.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn cancel(&self, post_id: &str) -> Result<DeleteAck, RepositoryError> {
        Ok(self.store.delete_application_by_post(post_id).await?)
    }
}
