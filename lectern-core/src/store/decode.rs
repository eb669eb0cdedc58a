//! Validation and coercion of loosely typed store records.
//!
//! The backing store is schemaless, so records arrive as JSON values and are
//! turned into model types here, once, before anything else sees them. The
//! posture is fail-closed throughout:
//!
//! - unknown role strings are dropped, never mapped to something wider
//! - a permission field that is not an array becomes the empty set
//! - a category without a usable `nameKey` is discarded, which turns its
//!   documents into admin-only orphans
//! - a document without `categoryKey` gets an empty key (an orphan)
//! - a malformed `updatedAt` becomes `None` and sorts as the oldest
//!
//! Records lacking an `id` are skipped entirely.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use lectern_model::{
    Category, CategoryId, Document, DocumentId, Role, Tag, TagId,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Raw collections as exported from the store, one JSON value per record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCatalog {
    pub categories: Vec<Value>,
    pub tags: Vec<Value>,
    pub documents: Vec<Value>,
}

/// Decoded, validated collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedCatalog {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub documents: Vec<Document>,
}

impl RawCatalog {
    pub fn decode(&self) -> DecodedCatalog {
        DecodedCatalog {
            categories: decode_categories(&self.categories),
            tags: decode_tags(&self.tags),
            documents: decode_documents(&self.documents),
        }
    }
}

pub fn decode_categories(values: &[Value]) -> Vec<Category> {
    values.iter().filter_map(decode_category).collect()
}

pub fn decode_tags(values: &[Value]) -> Vec<Tag> {
    values.iter().filter_map(decode_tag).collect()
}

pub fn decode_documents(values: &[Value]) -> Vec<Document> {
    values.iter().filter_map(decode_document).collect()
}

pub fn decode_category(value: &Value) -> Option<Category> {
    let record = as_record(value, "category")?;
    let id = record_id(record, "category").and_then(|id| CategoryId::new(id).ok())?;

    let Some(name_key) = non_empty_str(record, "nameKey") else {
        warn!(category = %id, "category without nameKey discarded");
        return None;
    };

    Some(Category {
        view_permissions: role_set(record, "viewPermissions", id.as_str()),
        id,
        name_key: name_key.to_string(),
    })
}

pub fn decode_tag(value: &Value) -> Option<Tag> {
    let record = as_record(value, "tag")?;
    let id = record_id(record, "tag").and_then(|id| TagId::new(id).ok())?;
    let name = non_empty_str(record, "name").unwrap_or(id.as_str()).to_string();
    let color = non_empty_str(record, "color").unwrap_or_default().to_string();
    Some(Tag { id, name, color })
}

pub fn decode_document(value: &Value) -> Option<Document> {
    let record = as_record(value, "document")?;
    let id = record_id(record, "document").and_then(|id| DocumentId::new(id).ok())?;

    let category_key = match record.get("categoryKey") {
        Some(Value::String(key)) => key.trim().to_string(),
        _ => {
            warn!(document = %id, "document without categoryKey treated as orphan");
            String::new()
        }
    };

    Some(Document {
        category_key,
        tag_ids: tag_set(record, id.as_str()),
        view_permissions: role_set(record, "viewPermissions", id.as_str()),
        download_permissions: role_set(
            record,
            "downloadPermissions",
            id.as_str(),
        ),
        updated_at: record.get("updatedAt").and_then(decode_timestamp),
        title: non_empty_str(record, "title").map(str::to_string),
        title_key: non_empty_str(record, "titleKey").map(str::to_string),
        description: non_empty_str(record, "description").map(str::to_string),
        id,
    })
}

/// Epoch milliseconds, RFC 3339 strings, and `{seconds, nanoseconds}`
/// objects (with or without leading underscores) are accepted.
pub fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Value::Object(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

fn as_record<'a>(value: &'a Value, kind: &str) -> Option<&'a Map<String, Value>> {
    let record = value.as_object();
    if record.is_none() {
        warn!(kind, "non-object record skipped");
    }
    record
}

fn record_id<'a>(record: &'a Map<String, Value>, kind: &str) -> Option<&'a str> {
    let id = non_empty_str(record, "id");
    if id.is_none() {
        warn!(kind, "record without id skipped");
    }
    id
}

fn non_empty_str<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn role_set(
    record: &Map<String, Value>,
    field: &str,
    owner: &str,
) -> BTreeSet<Role> {
    let entries = match record.get(field) {
        None | Some(Value::Null) => return BTreeSet::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            warn!(owner, field, "malformed permission list treated as empty");
            return BTreeSet::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| match entry.as_str().map(str::parse::<Role>) {
            Some(Ok(role)) => Some(role),
            _ => {
                warn!(owner, field, value = %entry, "unknown role dropped");
                None
            }
        })
        .collect()
}

fn tag_set(record: &Map<String, Value>, owner: &str) -> BTreeSet<TagId> {
    let Some(entries) = record.get("tagIds").and_then(Value::as_array) else {
        return BTreeSet::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let tag = entry.as_str().and_then(|id| TagId::new(id).ok());
            if tag.is_none() {
                warn!(owner, value = %entry, "invalid tag id dropped");
            }
            tag
        })
        .collect()
}
