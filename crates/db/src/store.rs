//! The [`Datastore`] trait: the single seam to the hosted backend.

use async_trait::async_trait;
use pagepilot_core::types::{ObjectId, Record};
use serde_json::Value;

use crate::error::DbError;
use crate::query::Query;

/// Rows returned by [`Datastore::find`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindResult {
    pub results: Vec<Record>,
    /// Total matching rows, present when the query asked for a count.
    pub count: Option<u64>,
}

/// Schema-less collection storage.
///
/// Rows are JSON objects carrying `objectId`, `createdAt` and `updatedAt`
/// in addition to their own fields.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Run a query against `class_name`.
    async fn find(&self, class_name: &str, query: &Query) -> Result<FindResult, DbError>;

    /// Fetch one row by id. `None` when it does not exist.
    async fn get(&self, class_name: &str, object_id: &str) -> Result<Option<Record>, DbError>;

    /// Insert a row and return its new id.
    async fn create(&self, class_name: &str, fields: Record) -> Result<ObjectId, DbError>;

    /// Patch the given fields of an existing row.
    async fn update(&self, class_name: &str, object_id: &str, fields: Record)
        -> Result<(), DbError>;

    /// Delete a row. Returns `false` when it did not exist.
    async fn delete(&self, class_name: &str, object_id: &str) -> Result<bool, DbError>;

    /// Create a class with the given field definitions
    /// (`{"name": {"type": "String"}}`).
    async fn create_class(
        &self,
        class_name: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DbError>;

    /// Convenience: the first row matching `query`.
    async fn first(&self, class_name: &str, query: Query) -> Result<Option<Record>, DbError> {
        let mut result = self.find(class_name, &query.limit(1)).await?;
        Ok(if result.results.is_empty() {
            None
        } else {
            Some(result.results.swap_remove(0))
        })
    }

    /// Convenience: the number of rows matching `query`.
    async fn count(&self, class_name: &str, query: Query) -> Result<u64, DbError> {
        let result = self.find(class_name, &query.limit(0).with_count()).await?;
        Ok(result.count.unwrap_or(result.results.len() as u64))
    }
}

/// Read the `objectId` of a row.
pub fn object_id(row: &Record) -> Option<&str> {
    row.get("objectId").and_then(Value::as_str)
}
