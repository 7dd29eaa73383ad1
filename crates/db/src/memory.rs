//! In-process [`Datastore`] used by tests and credential-less local runs.
//!
//! Interprets [`Query`] with the same semantics the hosted backend applies:
//! pointer equality by `objectId`, date comparisons across `Date` objects
//! and ISO strings, multi-key ordering, skip/limit, counts and single-level
//! `include`.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pagepilot_core::types::{ObjectId, Record};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::query::{Constraint, Query, SortDirection};
use crate::store::{Datastore, FindResult};
use crate::values;

#[derive(Default)]
pub struct MemoryStore {
    /// class name -> rows in insertion order
    classes: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row verbatim (test seeding). Assigns an id when missing.
    pub async fn seed(&self, class_name: &str, mut row: Record) -> ObjectId {
        let id = match row.get("objectId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = new_object_id();
                row.insert("objectId".into(), Value::String(id.clone()));
                id
            }
        };
        let now = Value::String(values::iso(Utc::now()));
        row.entry("createdAt").or_insert_with(|| now.clone());
        row.entry("updatedAt").or_insert(now);
        self.classes
            .write()
            .await
            .entry(class_name.to_string())
            .or_default()
            .push(row);
        id
    }

    /// Snapshot of every row in a class (test assertions).
    pub async fn all(&self, class_name: &str) -> Vec<Record> {
        self.classes
            .read()
            .await
            .get(class_name)
            .cloned()
            .unwrap_or_default()
    }

    fn resolve_includes(
        classes: &HashMap<String, Vec<Record>>,
        row: &mut Record,
        include: &[String],
    ) {
        for field in include {
            let Some(Value::Object(ptr)) = row.get(field) else {
                continue;
            };
            let (Some(class), Some(id)) = (
                ptr.get("className").and_then(Value::as_str).map(str::to_string),
                ptr.get("objectId").and_then(Value::as_str).map(str::to_string),
            ) else {
                continue;
            };
            let target = classes.get(&class).and_then(|rows| {
                rows.iter()
                    .find(|r| r.get("objectId").and_then(Value::as_str) == Some(id.as_str()))
            });
            if let Some(target) = target {
                let mut expanded = target.clone();
                expanded.insert("__type".into(), Value::String("Object".into()));
                expanded.insert("className".into(), Value::String(class));
                row.insert(field.clone(), Value::Object(expanded));
            }
        }
    }
}

fn new_object_id() -> ObjectId {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

// ---------------------------------------------------------------------------
// Query evaluation
// ---------------------------------------------------------------------------

/// A value reduced to something orderable.
#[derive(Debug, PartialEq, PartialOrd)]
enum Comparable {
    Number(f64),
    Time(i64),
    Text(String),
    Bool(bool),
}

fn comparable(value: &Value) -> Option<Comparable> {
    if let Some(ts) = values::parse_date(value) {
        return Some(Comparable::Time(ts.timestamp_millis()));
    }
    match value {
        Value::Number(n) => n.as_f64().map(Comparable::Number),
        Value::String(s) => Some(Comparable::Text(s.clone())),
        Value::Bool(b) => Some(Comparable::Bool(*b)),
        Value::Object(_) => values::pointer_id(value).map(|id| Comparable::Text(id.to_string())),
        _ => None,
    }
}

fn values_equal(stored: Option<&Value>, expected: &Value) -> bool {
    let Some(stored) = stored else {
        return expected.is_null();
    };
    if let (Some(a), Some(b)) = (values::pointer_id(stored), values::pointer_id(expected)) {
        return a == b;
    }
    match (comparable(stored), comparable(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => stored == expected,
    }
}

fn compare(stored: Option<&Value>, operand: &Value) -> Option<Ordering> {
    let a = comparable(stored?)?;
    let b = comparable(operand)?;
    // Values of different kinds never satisfy a range constraint.
    if std::mem::discriminant(&a) != std::mem::discriminant(&b) {
        return None;
    }
    a.partial_cmp(&b)
}

fn matches(row: &Record, field: &str, constraint: &Constraint) -> bool {
    let stored = row.get(field).filter(|v| !v.is_null());
    match constraint {
        Constraint::Eq(v) => values_equal(stored, v),
        Constraint::Ne(v) => !values_equal(stored, v),
        Constraint::Lt(v) => compare(stored, v) == Some(Ordering::Less),
        Constraint::Lte(v) => matches!(compare(stored, v), Some(Ordering::Less | Ordering::Equal)),
        Constraint::Gt(v) => compare(stored, v) == Some(Ordering::Greater),
        Constraint::Gte(v) => {
            matches!(compare(stored, v), Some(Ordering::Greater | Ordering::Equal))
        }
        Constraint::Exists(expected) => stored.is_some() == *expected,
        Constraint::In(options) => options.iter().any(|v| values_equal(stored, v)),
    }
}

fn sort_rows(rows: &mut [Record], query: &Query) {
    if query.order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in &query.order {
            let left = a.get(&key.field).and_then(comparable);
            let right = b.get(&key.field).and_then(comparable);
            // Missing values sort first, like the hosted backend.
            let ord = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            };
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

// ---------------------------------------------------------------------------
// Datastore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Datastore for MemoryStore {
    async fn find(&self, class_name: &str, query: &Query) -> Result<FindResult, DbError> {
        let classes = self.classes.read().await;
        let mut rows: Vec<Record> = classes
            .get(class_name)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .constraints
                            .iter()
                            .all(|(field, c)| matches(row, field, c))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_rows(&mut rows, query);
        let total = rows.len() as u64;

        let mut page: Vec<Record> = rows
            .into_iter()
            .skip(query.skip as usize)
            .take(query.effective_limit() as usize)
            .collect();
        for row in &mut page {
            Self::resolve_includes(&classes, row, &query.include);
        }

        Ok(FindResult {
            results: page,
            count: query.count.then_some(total),
        })
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<Option<Record>, DbError> {
        let classes = self.classes.read().await;
        Ok(classes.get(class_name).and_then(|rows| {
            rows.iter()
                .find(|r| r.get("objectId").and_then(Value::as_str) == Some(object_id))
                .cloned()
        }))
    }

    async fn create(&self, class_name: &str, mut fields: Record) -> Result<ObjectId, DbError> {
        fields.remove("objectId");
        fields.remove("createdAt");
        fields.remove("updatedAt");
        Ok(self.seed(class_name, fields).await)
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: Record,
    ) -> Result<(), DbError> {
        let mut classes = self.classes.write().await;
        let row = classes
            .get_mut(class_name)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("objectId").and_then(Value::as_str) == Some(object_id))
            })
            .ok_or_else(|| DbError::Api {
                status: 404,
                code: Some(101),
                message: "Object not found.".to_string(),
            })?;

        for (key, value) in fields {
            if matches!(key.as_str(), "objectId" | "createdAt" | "updatedAt") {
                continue;
            }
            // `{"__op": "Delete"}` unsets a field.
            if value.get("__op").and_then(Value::as_str) == Some("Delete") {
                row.remove(&key);
            } else {
                row.insert(key, value);
            }
        }
        row.insert(
            "updatedAt".into(),
            Value::String(values::iso(Utc::now())),
        );
        Ok(())
    }

    async fn delete(&self, class_name: &str, object_id: &str) -> Result<bool, DbError> {
        let mut classes = self.classes.write().await;
        let Some(rows) = classes.get_mut(class_name) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.get("objectId").and_then(Value::as_str) != Some(object_id));
        Ok(rows.len() != before)
    }

    async fn create_class(
        &self,
        class_name: &str,
        _fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DbError> {
        let mut classes = self.classes.write().await;
        if classes.contains_key(class_name) {
            return Err(DbError::Api {
                status: 400,
                code: Some(103),
                message: format!("Class {class_name} already exists."),
            });
        }
        classes.insert(class_name.to_string(), Vec::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let id = store.create("FbLead", row(json!({"fullName": "Ana"}))).await.unwrap();
        let stored = store.get("FbLead", &id).await.unwrap().unwrap();
        assert_eq!(stored["fullName"], "Ana");
        assert!(stored.contains_key("createdAt"));
        assert_eq!(id.len(), 10);
    }

    #[tokio::test]
    async fn pointer_equality_matches_by_object_id() {
        let store = MemoryStore::new();
        store
            .seed("FbLead", row(json!({"business": values::pointer("Business", "b1")})))
            .await;
        store
            .seed("FbLead", row(json!({"business": values::pointer("Business", "b2")})))
            .await;

        let q = Query::new().eq("business", values::pointer("Business", "b1"));
        let result = store.find("FbLead", &q).await.unwrap();
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn date_ranges_compare_date_objects() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .seed("NurtureEnrollment", row(json!({"nextSendAt": values::date(now - Duration::hours(1))})))
            .await;
        store
            .seed("NurtureEnrollment", row(json!({"nextSendAt": values::date(now + Duration::hours(1))})))
            .await;

        let q = Query::new().lte("nextSendAt", values::date(now));
        assert_eq!(store.find("NurtureEnrollment", &q).await.unwrap().results.len(), 1);
    }

    #[tokio::test]
    async fn exists_and_ne() {
        let store = MemoryStore::new();
        store.seed("C", row(json!({"a": 1}))).await;
        store.seed("C", row(json!({"a": null}))).await;
        store.seed("C", row(json!({}))).await;

        let exists = store.find("C", &Query::new().exists("a", true)).await.unwrap();
        assert_eq!(exists.results.len(), 1);
        let ne = store.find("C", &Query::new().ne("a", json!(1))).await.unwrap();
        assert_eq!(ne.results.len(), 2);
    }

    #[tokio::test]
    async fn order_skip_limit_and_count() {
        let store = MemoryStore::new();
        for score in [30, 10, 50, 20, 40] {
            store.seed("FbLead", row(json!({"leadScore": score}))).await;
        }
        let q = Query::new()
            .order_by("leadScore", SortDirection::Desc)
            .skip(1)
            .limit(2)
            .with_count();
        let result = store.find("FbLead", &q).await.unwrap();
        let scores: Vec<_> = result.results.iter().map(|r| r["leadScore"].clone()).collect();
        assert_eq!(scores, vec![json!(40), json!(30)]);
        assert_eq!(result.count, Some(5));
    }

    #[tokio::test]
    async fn include_expands_pointer() {
        let store = MemoryStore::new();
        let biz = store.seed("Business", row(json!({"name": "Shop"}))).await;
        store
            .seed("FbLead", row(json!({"business": values::pointer("Business", &biz)})))
            .await;

        let result = store
            .find("FbLead", &Query::new().include("business"))
            .await
            .unwrap();
        let business = &result.results[0]["business"];
        assert_eq!(business["name"], "Shop");
        assert_eq!(business["objectId"], biz.as_str());
    }

    #[tokio::test]
    async fn update_patches_and_delete_op_unsets() {
        let store = MemoryStore::new();
        let id = store.seed("C", row(json!({"a": 1, "b": 2}))).await;
        store
            .update("C", &id, row(json!({"a": 5, "b": {"__op": "Delete"}})))
            .await
            .unwrap();
        let stored = store.get("C", &id).await.unwrap().unwrap();
        assert_eq!(stored["a"], 5);
        assert!(!stored.contains_key("b"));
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("C", "nope", Record::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryStore::new();
        let id = store.seed("C", Record::new()).await;
        assert!(store.delete("C", &id).await.unwrap());
        assert!(!store.delete("C", &id).await.unwrap());
    }

    #[tokio::test]
    async fn first_and_count_helpers() {
        let store = MemoryStore::new();
        store.seed("C", row(json!({"k": "x"}))).await;
        store.seed("C", row(json!({"k": "x"}))).await;
        assert_eq!(store.count("C", Query::new().eq("k", json!("x"))).await.unwrap(), 2);
        assert!(store.first("C", Query::new().eq("k", json!("y"))).await.unwrap().is_none());
    }
}
