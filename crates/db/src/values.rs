//! Encoding helpers for the datastore's typed JSON values.
//!
//! Parse represents pointers as
//! `{"__type": "Pointer", "className": C, "objectId": id}` and dates as
//! `{"__type": "Date", "iso": "..."}`. The built-in `createdAt` and
//! `updatedAt` fields are plain ISO strings instead, so decoding accepts
//! both forms.

use chrono::{DateTime, SecondsFormat, Utc};
use pagepilot_core::types::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Encode a pointer to `class_name/object_id`.
pub fn pointer(class_name: &str, object_id: &str) -> Value {
    json!({
        "__type": "Pointer",
        "className": class_name,
        "objectId": object_id,
    })
}

/// Encode a timestamp as a datastore date.
pub fn date(ts: Timestamp) -> Value {
    json!({
        "__type": "Date",
        "iso": iso(ts),
    })
}

/// The current time encoded as a datastore date.
pub fn now() -> Value {
    date(Utc::now())
}

/// Millisecond-precision ISO-8601 string with a `Z` suffix.
pub fn iso(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decode a date from either a `Date` object or a bare ISO string.
pub fn parse_date(value: &Value) -> Option<Timestamp> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) if map.get("__type").and_then(Value::as_str) == Some("Date") => {
            map.get("iso")?.as_str()?
        }
        _ => return None,
    };
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The `objectId` of a pointer (or of an included object).
pub fn pointer_id(value: &Value) -> Option<&str> {
    value.as_object()?.get("objectId")?.as_str()
}

/// A pointer or an eagerly-loaded object. Any extra fields of an included
/// object are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    #[serde(rename = "className", default)]
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

impl Pointer {
    pub fn to_value(&self) -> Value {
        pointer(&self.class_name, &self.object_id)
    }
}

/// Serde adapter for optional date fields on models.
pub mod optional_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse_date))
    }

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match value {
            Some(ts) => date(*ts).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}
