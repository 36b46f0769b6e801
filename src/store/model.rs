//! Field names, filters and write acknowledgements shared by the store backends.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A schema-less JSON document as stored in either collection.
pub type Document = Map<String, Value>;

pub const ID: &str = "_id";
pub const POST_TITLE: &str = "postTitle";
pub const DEADLINE: &str = "deadline";
pub const VOLUNTEER_SLOTS: &str = "numberOfVolunteers";
pub const ORGANIZER_EMAIL: &str = "organizer.email";
pub const POST_ID: &str = "postId";
pub const APPLICANT_EMAIL: &str = "email";

/// Unsorted post lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostFilter {
    /// Case-insensitive literal substring of `postTitle`.
    TitleContains(String),
    OrganizerEmail(String),
    Ids(Vec<ObjectId>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplicationFilter {
    Applicant(String),
    Organizer(String),
}

/// Outcome of the conditional slot decrement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotReservation {
    Reserved,
    Full,
    MissingPost,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertAck {
    #[must_use]
    pub fn new(inserted_id: String) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    #[must_use]
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Resolve a dotted path (`organizer.email`) inside a document.
#[must_use]
pub fn field<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Write `value` at a dotted path the way `$set` does, creating missing
/// parent objects. Returns whether the document changed, or `None` when a
/// non-object value sits on the path.
pub fn set_field(document: &mut Document, path: &str, value: Value) -> Option<bool> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = document;
    for part in parents.into_iter().flat_map(|parents| parents.split('.')) {
        current = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Document::new()))
            .as_object_mut()?;
    }

    if current.get(leaf) == Some(&value) {
        return Some(false);
    }
    current.insert(leaf.to_string(), value);
    Some(true)
}
