//! Firestore REST wire format for documents and photo groups.

use crate::models::{GroupField, PhotoGroup, Slot};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// A document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Document {
    /// Full resource name, ending in the document ID.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds, sent as a decimal string.
    #[serde(default)]
    pub expires_in: Option<String>,
    #[serde(default)]
    pub local_id: Option<String>,
}

/// Secure Token API answer to a refresh-token exchange.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Lifetime in seconds from an `expiresIn` value; one hour when absent or
/// unparseable.
pub(crate) fn token_lifetime_secs(expires_in: Option<&str>) -> u64 {
    expires_in
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(3600)
}

/// Read the photo-group field out of a document's fields.
pub(crate) fn decode_group_field(fields: &Map<String, Value>, name: &str) -> GroupField {
    let Some(value) = fields.get(name) else {
        return GroupField::Absent;
    };
    if value.get("nullValue").is_some() {
        return GroupField::Absent;
    }
    let Some(map) = value.get("mapValue") else {
        return GroupField::Invalid(format!("{} is not a map", name));
    };

    let empty = Map::new();
    let entries = map
        .get("fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut group = PhotoGroup::new();
    for (key, raw) in entries {
        let Some(slot) = Slot::from_str(key) else {
            return GroupField::Invalid(format!("unknown slot '{}'", key));
        };
        if let Some(s) = raw.get("stringValue").and_then(Value::as_str) {
            group.insert(slot, Some(s.to_string()));
        } else if raw.get("nullValue").is_some() {
            group.insert(slot, None);
        } else {
            return GroupField::Invalid(format!("slot '{}' is not a string", key));
        }
    }
    GroupField::Present(group)
}

pub(crate) fn encode_group(group: &PhotoGroup) -> Value {
    let fields: Map<String, Value> = group
        .iter()
        .map(|(slot, value)| {
            let encoded = match value {
                Some(s) => json!({ "stringValue": s }),
                None => json!({ "nullValue": null }),
            };
            (slot.as_str().to_string(), encoded)
        })
        .collect();
    json!({ "mapValue": { "fields": fields } })
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339_opts(SecondsFormat::Micros, true) })
}
