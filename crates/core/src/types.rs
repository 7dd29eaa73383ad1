/// Datastore object ids are opaque strings assigned by the hosted backend.
pub type ObjectId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A schema-less datastore row: field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;
