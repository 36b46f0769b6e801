use super::{
    model::{
        field, set_field, APPLICANT_EMAIL, DEADLINE, ID, ORGANIZER_EMAIL, POST_ID, POST_TITLE,
        VOLUNTEER_SLOTS,
    },
    ApplicationFilter, DeleteAck, Document, InsertAck, PostFilter, SlotReservation, Store,
    StoreError, UpdateAck,
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::cmp::Ordering;
use tokio::sync::RwLock;

/// In-process store keeping both collections in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    posts: Vec<Document>,
    applications: Vec<Document>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_id(document: &Document, id: &ObjectId) -> bool {
    document.get(ID).and_then(Value::as_str) == Some(id.to_hex().as_str())
}

fn with_new_id(mut document: Document) -> (String, Document) {
    let id = ObjectId::new().to_hex();
    document.insert(ID.to_string(), Value::String(id.clone()));
    (id, document)
}

fn string_field_is(document: &Document, path: &str, expected: &str) -> bool {
    field(document, path).and_then(Value::as_str) == Some(expected)
}

fn post_matches(post: &Document, filter: &PostFilter) -> bool {
    match filter {
        PostFilter::TitleContains(needle) => field(post, POST_TITLE)
            .and_then(Value::as_str)
            .is_some_and(|title| title.to_lowercase().contains(&needle.to_lowercase())),
        PostFilter::OrganizerEmail(email) => string_field_is(post, ORGANIZER_EMAIL, email),
        PostFilter::Ids(ids) => ids.iter().any(|id| has_id(post, id)),
    }
}

fn application_matches(application: &Document, filter: &ApplicationFilter) -> bool {
    match filter {
        ApplicationFilter::Applicant(email) => string_field_is(application, APPLICANT_EMAIL, email),
        ApplicationFilter::Organizer(email) => string_field_is(application, ORGANIZER_EMAIL, email),
    }
}

// Mirrors the BSON comparison order: missing/null < numbers < strings < objects < arrays < booleans.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn decrement(slots: &Value) -> Option<Value> {
    if let Some(count) = slots.as_i64() {
        return (count > 0).then(|| Value::from(count - 1));
    }
    slots
        .as_f64()
        .filter(|count| *count > 0.0)
        .map(|count| Value::from(count - 1.0))
}

fn increment(slots: Option<&Value>) -> Value {
    match slots {
        Some(value) if value.is_i64() => Value::from(value.as_i64().unwrap_or(0) + 1),
        Some(value) if value.is_f64() => Value::from(value.as_f64().unwrap_or(0.0) + 1.0),
        _ => Value::from(1),
    }
}

// Dotted keys address embedded fields, as with MongoDB's `$set`.
fn apply_set(post: &mut Document, fields: Document) -> Result<bool, StoreError> {
    let mut modified = false;
    for (path, value) in fields {
        modified |= set_field(post, &path, value).ok_or(StoreError::FieldPath(path))?;
    }
    Ok(modified)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_posts(&self, limit: Option<u64>) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut posts = collections.posts.clone();
        // stable sort keeps insertion order between equal deadlines
        posts.sort_by(|a, b| compare_values(a.get(DEADLINE), b.get(DEADLINE)));
        if let Some(limit) = limit {
            posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(posts)
    }

    async fn find_posts(&self, filter: &PostFilter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .posts
            .iter()
            .filter(|post| post_matches(post, filter))
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.posts.iter().find(|post| has_id(post, id)).cloned())
    }

    async fn insert_post(&self, post: Document) -> Result<InsertAck, StoreError> {
        let (id, post) = with_new_id(post);
        self.collections.write().await.posts.push(post);
        Ok(InsertAck::new(id))
    }

    async fn upsert_post(
        &self,
        id: &ObjectId,
        mut fields: Document,
    ) -> Result<UpdateAck, StoreError> {
        fields.remove(ID);
        let mut collections = self.collections.write().await;

        if let Some(post) = collections.posts.iter_mut().find(|post| has_id(post, id)) {
            // applied to a copy so a rejected path leaves the post untouched
            let mut updated = post.clone();
            let modified = apply_set(&mut updated, fields)?;
            *post = updated;
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_count: 0,
                upserted_id: None,
            });
        }

        let mut post = Document::new();
        post.insert(ID.to_string(), Value::String(id.to_hex()));
        apply_set(&mut post, fields)?;
        collections.posts.push(post);

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id.to_hex()),
        })
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<DeleteAck, StoreError> {
        let mut collections = self.collections.write().await;
        let position = collections.posts.iter().position(|post| has_id(post, id));
        if let Some(index) = position {
            collections.posts.remove(index);
        }
        Ok(DeleteAck::new(u64::from(position.is_some())))
    }

    async fn reserve_slot(&self, post_id: &ObjectId) -> Result<SlotReservation, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(post) = collections
            .posts
            .iter_mut()
            .find(|post| has_id(post, post_id))
        else {
            return Ok(SlotReservation::MissingPost);
        };

        match post.get(VOLUNTEER_SLOTS).and_then(decrement) {
            Some(remaining) => {
                post.insert(VOLUNTEER_SLOTS.to_string(), remaining);
                Ok(SlotReservation::Reserved)
            }
            None => Ok(SlotReservation::Full),
        }
    }

    async fn release_slot(&self, post_id: &ObjectId) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(post) = collections
            .posts
            .iter_mut()
            .find(|post| has_id(post, post_id))
        {
            let restored = increment(post.get(VOLUNTEER_SLOTS));
            post.insert(VOLUNTEER_SLOTS.to_string(), restored);
        }
        Ok(())
    }

    async fn insert_application(&self, application: Document) -> Result<InsertAck, StoreError> {
        let (id, application) = with_new_id(application);
        self.collections.write().await.applications.push(application);
        Ok(InsertAck::new(id))
    }

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .applications
            .iter()
            .filter(|application| application_matches(application, filter))
            .cloned()
            .collect())
    }

    async fn delete_application_by_post(&self, post_id: &str) -> Result<DeleteAck, StoreError> {
        let mut collections = self.collections.write().await;
        let position = collections
            .applications
            .iter()
            .position(|application| string_field_is(application, POST_ID, post_id));
        if let Some(index) = position {
            collections.applications.remove(index);
        }
        Ok(DeleteAck::new(u64::from(position.is_some())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn list_posts_orders_by_deadline_and_limits() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        for deadline in ["2024-09-01", "2024-03-15", "2024-06-30"] {
            store
                .insert_post(document(json!({ "deadline": deadline })))
                .await?;
        }
        store.insert_post(document(json!({ "postTitle": "no deadline" }))).await?;

        let deadlines: Vec<Option<Value>> = store
            .list_posts(None)
            .await?
            .iter()
            .map(|post| post.get(DEADLINE).cloned())
            .collect();
        assert_eq!(
            deadlines,
            vec![
                None,
                Some(json!("2024-03-15")),
                Some(json!("2024-06-30")),
                Some(json!("2024-09-01")),
            ]
        );

        assert_eq!(store.list_posts(Some(2)).await?.len(), 2);
        Ok(())
    }

    #[test]
    fn numbers_sort_before_strings() {
        let number = json!(5);
        let string = json!("2024-01-01");
        assert_eq!(
            compare_values(Some(&number), Some(&string)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!(2.5)), Some(&json!(10))),
            Ordering::Less
        );
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive_substring() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store
            .insert_post(document(json!({ "postTitle": "Beach Cleanup" })))
            .await?;
        store
            .insert_post(document(json!({ "postTitle": "Tree Planting" })))
            .await?;

        let found = store
            .find_posts(&PostFilter::TitleContains("bEACH".to_string()))
            .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get(POST_TITLE), Some(&json!("Beach Cleanup")));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_creates_missing_post_with_given_id() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let id = ObjectId::new();

        let ack = store
            .upsert_post(&id, document(json!({ "postTitle": "Food Drive" })))
            .await?;
        assert_eq!(ack.upserted_count, 1);
        assert_eq!(ack.upserted_id, Some(id.to_hex()));

        let post = store.get_post(&id).await?;
        assert_eq!(
            post.as_ref().and_then(|post| post.get(POST_TITLE)),
            Some(&json!("Food Drive"))
        );

        let ack = store
            .upsert_post(&id, document(json!({ "postTitle": "Food Drive" })))
            .await?;
        assert_eq!((ack.matched_count, ack.modified_count), (1, 0));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_sets_dotted_paths_inside_embedded_objects() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let ack = store
            .insert_post(document(json!({
                "postTitle": "Beach Cleanup",
                "organizer": { "email": "old@x.com", "name": "Org" }
            })))
            .await?;
        let id = ObjectId::parse_str(&ack.inserted_id)?;

        let ack = store
            .upsert_post(&id, document(json!({ "organizer.email": "new@x.com" })))
            .await?;
        assert_eq!((ack.matched_count, ack.modified_count), (1, 1));

        let post = store.get_post(&id).await?.unwrap_or_default();
        assert_eq!(
            post.get("organizer"),
            Some(&json!({ "email": "new@x.com", "name": "Org" }))
        );
        assert!(!post.contains_key(ORGANIZER_EMAIL));

        let found = store
            .find_posts(&PostFilter::OrganizerEmail("new@x.com".to_string()))
            .await?;
        assert_eq!(found.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_rejects_path_through_scalar_without_partial_write() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let ack = store
            .insert_post(document(json!({ "postTitle": "Beach Cleanup" })))
            .await?;
        let id = ObjectId::parse_str(&ack.inserted_id)?;

        let result = store
            .upsert_post(
                &id,
                document(json!({ "deadline": "2024-05-01", "postTitle.short": "Beach" })),
            )
            .await;
        assert!(matches!(result, Err(StoreError::FieldPath(path)) if path == "postTitle.short"));

        let post = store.get_post(&id).await?.unwrap_or_default();
        assert!(!post.contains_key(DEADLINE));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_expands_dotted_paths_on_insert() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let id = ObjectId::new();

        store
            .upsert_post(&id, document(json!({ "organizer.email": "org@x.com" })))
            .await?;

        let post = store.get_post(&id).await?.unwrap_or_default();
        assert_eq!(post.get("organizer"), Some(&json!({ "email": "org@x.com" })));
        Ok(())
    }

    #[tokio::test]
    async fn reserve_slot_stops_at_zero() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let ack = store
            .insert_post(document(json!({ "numberOfVolunteers": 1 })))
            .await?;
        let id = ObjectId::parse_str(&ack.inserted_id)?;

        assert_eq!(store.reserve_slot(&id).await?, SlotReservation::Reserved);
        assert_eq!(store.reserve_slot(&id).await?, SlotReservation::Full);

        store.release_slot(&id).await?;
        let post = store.get_post(&id).await?;
        assert_eq!(
            post.and_then(|post| post.get(VOLUNTEER_SLOTS).cloned()),
            Some(json!(1))
        );

        assert_eq!(
            store.reserve_slot(&ObjectId::new()).await?,
            SlotReservation::MissingPost
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_application_by_post_removes_one() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let post_id = ObjectId::new().to_hex();
        for email in ["a@x.com", "b@x.com"] {
            store
                .insert_application(document(json!({ "postId": post_id, "email": email })))
                .await?;
        }

        assert_eq!(store.delete_application_by_post(&post_id).await?.deleted_count, 1);
        assert_eq!(store.delete_application_by_post(&post_id).await?.deleted_count, 1);
        assert_eq!(store.delete_application_by_post(&post_id).await?.deleted_count, 0);
        Ok(())
    }
}
