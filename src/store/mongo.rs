use super::{
    model::{
        APPLICANT_EMAIL, DEADLINE, ID, ORGANIZER_EMAIL, POST_ID, POST_TITLE, VOLUNTEER_SLOTS,
    },
    ApplicationFilter, DeleteAck, Document, InsertAck, PostFilter, SlotReservation, Store,
    StoreError, UpdateAck,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document as BsonDocument},
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use serde_json::Value;
use tracing::{debug, instrument};

const POSTS_COLLECTION: &str = "posts";
const APPLICATIONS_COLLECTION: &str = "applications";

/// MongoDB backend holding handles to both collections of one database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    posts: Collection<BsonDocument>,
    applications: Collection<BsonDocument>,
}

impl MongoStore {
    /// Connect with the stable API v1 in strict mode.
    ///
    /// # Errors
    /// Returns an error if the connection string cannot be parsed or resolved.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;

        Ok(Self::new(client, database))
    }

    #[must_use]
    pub fn new(client: Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            posts: db.collection(POSTS_COLLECTION),
            applications: db.collection(APPLICATIONS_COLLECTION),
            client,
        }
    }
}

fn single(key: &str, value: impl Into<Bson>) -> BsonDocument {
    let mut document = BsonDocument::new();
    document.insert(key, value);
    document
}

fn by_id(id: &ObjectId) -> BsonDocument {
    single(ID, *id)
}

fn to_bson(document: Document) -> Result<BsonDocument, StoreError> {
    Ok(bson::to_document(&document)?)
}

/// Convert a stored document to JSON, rendering `_id` as a plain hex string
/// and BSON dates as RFC 3339 strings instead of `{"$date": ...}`.
fn to_json(mut document: BsonDocument) -> Document {
    if let Ok(id) = document.get_object_id(ID) {
        document.insert(ID, id.to_hex());
    }
    match dates_to_strings(Bson::Document(document)).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn dates_to_strings(value: Bson) -> Bson {
    match value {
        Bson::DateTime(date) => date
            .try_to_rfc3339_string()
            .map_or(Bson::DateTime(date), Bson::String),
        Bson::Document(document) => Bson::Document(
            document
                .into_iter()
                .map(|(key, value)| (key, dates_to_strings(value)))
                .collect(),
        ),
        Bson::Array(items) => Bson::Array(items.into_iter().map(dates_to_strings).collect()),
        other => other,
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(id) => id.to_hex(),
        Bson::String(id) => id.clone(),
        other => other.to_string(),
    }
}

fn post_filter(filter: &PostFilter) -> BsonDocument {
    match filter {
        PostFilter::TitleContains(needle) => single(
            POST_TITLE,
            doc! { "$regex": regex::escape(needle), "$options": "i" },
        ),
        PostFilter::OrganizerEmail(email) => single(ORGANIZER_EMAIL, email.as_str()),
        PostFilter::Ids(ids) => single(ID, doc! { "$in": ids.clone() }),
    }
}

fn application_filter(filter: &ApplicationFilter) -> BsonDocument {
    match filter {
        ApplicationFilter::Applicant(email) => single(APPLICANT_EMAIL, email.as_str()),
        ApplicationFilter::Organizer(email) => single(ORGANIZER_EMAIL, email.as_str()),
    }
}

async fn collect(cursor: mongodb::Cursor<BsonDocument>) -> Result<Vec<Document>, StoreError> {
    let documents: Vec<BsonDocument> = cursor.try_collect().await?;
    Ok(documents.into_iter().map(to_json).collect())
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, limit: Option<u64>) -> Result<Vec<Document>, StoreError> {
        let mut find = self.posts.find(doc! {}).sort(single(DEADLINE, 1));
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        collect(find.await?).await
    }

    #[instrument(skip(self))]
    async fn find_posts(&self, filter: &PostFilter) -> Result<Vec<Document>, StoreError> {
        let cursor = self.posts.find(post_filter(filter)).await?;
        collect(cursor).await
    }

    async fn get_post(&self, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self.posts.find_one(by_id(id)).await?.map(to_json))
    }

    async fn insert_post(&self, post: Document) -> Result<InsertAck, StoreError> {
        let result = self.posts.insert_one(to_bson(post)?).await?;
        Ok(InsertAck::new(id_to_string(&result.inserted_id)))
    }

    async fn upsert_post(
        &self,
        id: &ObjectId,
        fields: Document,
    ) -> Result<UpdateAck, StoreError> {
        let mut fields = to_bson(fields)?;
        // _id is immutable; $set on it fails for existing documents
        fields.remove(ID);

        let result = self
            .posts
            .update_one(by_id(id), doc! { "$set": fields })
            .upsert(true)
            .await?;

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.as_ref().map(id_to_string),
        })
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<DeleteAck, StoreError> {
        let result = self.posts.delete_one(by_id(id)).await?;
        Ok(DeleteAck::new(result.deleted_count))
    }

    #[instrument(skip(self))]
    async fn reserve_slot(&self, post_id: &ObjectId) -> Result<SlotReservation, StoreError> {
        let mut filter = by_id(post_id);
        filter.insert(VOLUNTEER_SLOTS, doc! { "$gt": 0 });
        let update = doc! { "$inc": single(VOLUNTEER_SLOTS, -1) };

        let reserved = self.posts.find_one_and_update(filter, update).await?;
        if reserved.is_some() {
            return Ok(SlotReservation::Reserved);
        }

        // Nothing matched: tell a full post apart from a missing one.
        let exists = self.posts.find_one(by_id(post_id)).await?.is_some();
        debug!("slot reservation rejected, post exists: {exists}");

        Ok(if exists {
            SlotReservation::Full
        } else {
            SlotReservation::MissingPost
        })
    }

    async fn release_slot(&self, post_id: &ObjectId) -> Result<(), StoreError> {
        self.posts
            .update_one(by_id(post_id), doc! { "$inc": single(VOLUNTEER_SLOTS, 1) })
            .await?;
        Ok(())
    }

    async fn insert_application(&self, application: Document) -> Result<InsertAck, StoreError> {
        let result = self.applications.insert_one(to_bson(application)?).await?;
        Ok(InsertAck::new(id_to_string(&result.inserted_id)))
    }

    #[instrument(skip(self))]
    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .applications
            .find(application_filter(filter))
            .await?;
        collect(cursor).await
    }

    async fn delete_application_by_post(&self, post_id: &str) -> Result<DeleteAck, StoreError> {
        let result = self
            .applications
            .delete_one(single(POST_ID, post_id))
            .await?;
        Ok(DeleteAck::new(result.deleted_count))
    }
}
