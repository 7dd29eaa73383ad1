//! Datastore query builder.
//!
//! A [`Query`] is a list of per-field constraints plus ordering, paging,
//! counting and single-level `include`. It renders to the REST parameters
//! Parse expects (`where`, `order`, `limit`, `skip`, `count`, `include`) and
//! is interpreted directly by the in-memory store.

use serde_json::{Map, Value};

/// Default page size when a query sets no limit.
pub const DEFAULT_LIMIT: u32 = 100;

/// Upper bound on rows fetched per request.
pub const MAX_LIMIT: u32 = 1000;

/// A constraint on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    Exists(bool),
    In(Vec<Value>),
}

impl Constraint {
    /// Operator key used in the `where` document (`None` for equality).
    fn operator(&self) -> Option<&'static str> {
        match self {
            Self::Eq(_) => None,
            Self::Ne(_) => Some("$ne"),
            Self::Lt(_) => Some("$lt"),
            Self::Lte(_) => Some("$lte"),
            Self::Gt(_) => Some("$gt"),
            Self::Gte(_) => Some("$gte"),
            Self::Exists(_) => Some("$exists"),
            Self::In(_) => Some("$in"),
        }
    }

    fn operand(&self) -> Value {
        match self {
            Self::Eq(v) | Self::Ne(v) | Self::Lt(v) | Self::Lte(v) | Self::Gt(v) | Self::Gte(v) => {
                v.clone()
            }
            Self::Exists(b) => Value::Bool(*b),
            Self::In(values) => Value::Array(values.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub constraints: Vec<(String, Constraint)>,
    pub order: Vec<SortKey>,
    pub limit: Option<u32>,
    pub skip: u32,
    pub count: bool,
    pub include: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constrain(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.push((field.into(), constraint));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: Value) -> Self {
        self.constrain(field, Constraint::Eq(value))
    }

    pub fn ne(self, field: impl Into<String>, value: Value) -> Self {
        self.constrain(field, Constraint::Ne(value))
    }

    pub fn lt(self, field: impl Into<String>, value: Value) -> Self {
        self.constrain(field, Constraint::Lt(value))
    }

    pub fn lte(self, field: impl Into<String>, value: Value) -> Self {
        self.constrain(field, Constraint::Lte(value))
    }

    pub fn gte(self, field: impl Into<String>, value: Value) -> Self {
        self.constrain(field, Constraint::Gte(value))
    }

    pub fn exists(self, field: impl Into<String>, exists: bool) -> Self {
        self.constrain(field, Constraint::Exists(exists))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.min(MAX_LIMIT));
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.include.push(field.into());
        self
    }

    /// Effective row limit.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Render the `where` document.
    ///
    /// Several operators on the same field merge into one operator object.
    /// An equality constraint on a field takes precedence over operators on
    /// that field.
    pub fn where_json(&self) -> Value {
        let mut doc = Map::new();
        for (field, constraint) in &self.constraints {
            match constraint.operator() {
                None => {
                    doc.insert(field.clone(), constraint.operand());
                }
                Some(op) => {
                    let has_eq = self
                        .constraints
                        .iter()
                        .any(|(f, c)| f == field && matches!(c, Constraint::Eq(_)));
                    if has_eq {
                        continue;
                    }
                    let entry = doc
                        .entry(field.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(ops) = entry {
                        ops.insert(op.to_string(), constraint.operand());
                    }
                }
            }
        }
        Value::Object(doc)
    }

    /// Render the `order` parameter (`-createdAt,name`).
    pub fn order_param(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        let keys: Vec<String> = self
            .order
            .iter()
            .map(|k| match k.direction {
                SortDirection::Asc => k.field.clone(),
                SortDirection::Desc => format!("-{}", k.field),
            })
            .collect();
        Some(keys.join(","))
    }

    /// All REST query parameters for a `GET /classes/{class}` request.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.constraints.is_empty() {
            params.push(("where", self.where_json().to_string()));
        }
        if let Some(order) = self.order_param() {
            params.push(("order", order));
        }
        params.push(("limit", self.effective_limit().to_string()));
        if self.skip > 0 {
            params.push(("skip", self.skip.to_string()));
        }
        if self.count {
            params.push(("count", "1".to_string()));
        }
        if !self.include.is_empty() {
            params.push(("include", self.include.join(",")));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::values;

    #[test]
    fn equality_renders_bare_value() {
        let q = Query::new().eq("psid", json!("123"));
        assert_eq!(q.where_json(), json!({ "psid": "123" }));
    }

    #[test]
    fn operators_on_same_field_merge() {
        let q = Query::new()
            .gte("leadScore", json!(60))
            .lt("leadScore", json!(90));
        assert_eq!(
            q.where_json(),
            json!({ "leadScore": { "$gte": 60, "$lt": 90 } })
        );
    }

    #[test]
    fn equality_wins_over_operators() {
        let q = Query::new()
            .exists("status", true)
            .eq("status", json!("active"));
        assert_eq!(q.where_json(), json!({ "status": "active" }));
    }

    #[test]
    fn pointer_equality() {
        let q = Query::new().eq("business", values::pointer("Business", "b1"));
        assert_eq!(q.where_json()["business"]["objectId"], "b1");
    }

    #[test]
    fn params_cover_order_paging_count_include() {
        let q = Query::new()
            .eq("status", json!("pending"))
            .order_by("createdAt", SortDirection::Desc)
            .order_by("name", SortDirection::Asc)
            .limit(25)
            .skip(50)
            .with_count()
            .include("business");
        let params = q.to_params();
        let get = |k: &str| params.iter().find(|(key, _)| *key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("where"), Some(r#"{"status":"pending"}"#));
        assert_eq!(get("order"), Some("-createdAt,name"));
        assert_eq!(get("limit"), Some("25"));
        assert_eq!(get("skip"), Some("50"));
        assert_eq!(get("count"), Some("1"));
        assert_eq!(get("include"), Some("business"));
    }

    #[test]
    fn empty_query_only_sends_default_limit() {
        let params = Query::new().to_params();
        assert_eq!(params, vec![("limit", DEFAULT_LIMIT.to_string())]);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Query::new().limit(50_000).effective_limit(), MAX_LIMIT);
    }
}
