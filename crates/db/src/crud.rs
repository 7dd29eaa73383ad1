//! Parameterized CRUD over named collections, as used by the dashboard.
//!
//! A [`CrudQuery`] describes one filtered, sorted, paginated view of a
//! collection. Mutations re-run the same query afterward so the caller
//! always receives the refreshed page.

use pagepilot_core::collections::{self, CollectionSpec, BUSINESS, FB_LEAD, TENANT_FIELD};
use pagepilot_core::error::CoreError;
use pagepilot_core::pipeline::{apply_stage_transition, PipelineStage, STAGE_FIELD};
use pagepilot_core::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DbError;
use crate::query::{Query, SortDirection, MAX_LIMIT};
use crate::repositories::LeadRepo;
use crate::store::Datastore;
use crate::values;

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// One dashboard view of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudQuery {
    pub collection: String,
    /// Selected business. The tenant filter applies only when non-empty.
    pub tenant_id: Option<String>,
    /// Exact-match equality filters. Null and empty-string values are
    /// ignored (an unset filter input).
    pub filters: Record,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    /// Pointer fields to eager-load (one level).
    pub include: Vec<String>,
}

impl Default for CrudQuery {
    fn default() -> Self {
        Self {
            collection: String::new(),
            tenant_id: None,
            filters: Record::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: None,
            sort_direction: SortDirection::Desc,
            include: Vec::new(),
        }
    }
}

impl CrudQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// The selected tenant, if any.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Render the datastore query for this view of `spec`.
    pub fn to_query(&self, spec: &CollectionSpec) -> Query {
        let mut query = Query::new().with_count();

        if let Some(tenant) = self.tenant() {
            if spec.tenant_scoped {
                query = query.eq(TENANT_FIELD, values::pointer(BUSINESS, tenant));
            }
        }

        for (field, value) in &self.filters {
            let unset = value.is_null() || value.as_str() == Some("");
            if unset || (field == TENANT_FIELD && self.tenant().is_some()) {
                continue;
            }
            query = query.eq(field.clone(), value.clone());
        }

        let sort_field = self.sort_field.as_deref().unwrap_or("createdAt");
        query = query.order_by(sort_field, self.sort_direction);

        let page_size = self.page_size.clamp(1, MAX_LIMIT);
        let page = self.page.max(1);
        query = query
            .limit(page_size)
            .skip((page - 1).saturating_mul(page_size));

        for field in &self.include {
            query = query.include(field.clone());
        }
        query
    }
}

/// A page of rows plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<Record>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

/// CRUD operations keyed by a [`CrudQuery`].
pub struct CrudView;

impl CrudView {
    /// Look up a collection descriptor, rejecting unknown names.
    pub fn spec(collection: &str) -> Result<&'static CollectionSpec, DbError> {
        collections::find(collection).ok_or_else(|| {
            CoreError::NotFound {
                entity: "collection",
                id: collection.to_string(),
            }
            .into()
        })
    }

    pub async fn list(store: &dyn Datastore, query: &CrudQuery) -> Result<Page, DbError> {
        let spec = Self::spec(&query.collection)?;
        let rendered = query.to_query(spec);
        let result = store.find(spec.name, &rendered).await?;
        Ok(Page {
            total_count: result.count.unwrap_or(result.results.len() as u64),
            rows: result.results,
            page: query.page.max(1),
            page_size: rendered.effective_limit(),
        })
    }

    /// Insert a row, then return the refreshed page. New rows in a
    /// tenant-scoped collection inherit the selected business.
    pub async fn create(
        store: &dyn Datastore,
        query: &CrudQuery,
        mut fields: Record,
    ) -> Result<Page, DbError> {
        let spec = Self::spec(&query.collection)?;
        strip_system_fields(&mut fields);
        fields.retain(|_, v| !v.is_null());
        if spec.tenant_scoped && !fields.contains_key(TENANT_FIELD) {
            if let Some(tenant) = query.tenant() {
                fields.insert(TENANT_FIELD.into(), values::pointer(BUSINESS, tenant));
            }
        }
        if spec.name == FB_LEAD {
            fields
                .entry(STAGE_FIELD)
                .or_insert_with(|| Value::String(PipelineStage::Inquiry.as_str().to_string()));
            apply_stage_transition(None, &mut fields, values::now())?;
        }
        let id = store.create(spec.name, fields).await?;
        tracing::info!(collection = spec.name, object_id = %id, "Row created");
        Self::list(store, query).await
    }

    /// Patch a row, then return the refreshed page.
    pub async fn update(
        store: &dyn Datastore,
        query: &CrudQuery,
        id: &str,
        mut fields: Record,
    ) -> Result<Page, DbError> {
        let spec = Self::spec(&query.collection)?;
        strip_system_fields(&mut fields);
        if spec.name == FB_LEAD {
            LeadRepo::prepare_update(store, id, &mut fields).await?;
        }
        store.update(spec.name, id, fields).await?;
        tracing::info!(collection = spec.name, object_id = %id, "Row updated");
        Self::list(store, query).await
    }

    /// Delete a row, then return the refreshed page.
    pub async fn delete(store: &dyn Datastore, query: &CrudQuery, id: &str) -> Result<Page, DbError> {
        let spec = Self::spec(&query.collection)?;
        if !store.delete(spec.name, id).await? {
            return Err(CoreError::NotFound {
                entity: "row",
                id: id.to_string(),
            }
            .into());
        }
        tracing::info!(collection = spec.name, object_id = %id, "Row deleted");
        Self::list(store, query).await
    }
}

fn strip_system_fields(fields: &mut Record) {
    for key in ["objectId", "createdAt", "updatedAt"] {
        fields.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use pagepilot_core::collections::MESSAGE;
    use serde_json::json;

    use super::*;
    use crate::query::Constraint;

    fn tenant_constraint(query: &Query) -> Option<&Constraint> {
        query
            .constraints
            .iter()
            .find(|(f, _)| f == TENANT_FIELD)
            .map(|(_, c)| c)
    }

    #[test]
    fn tenant_filter_applied_when_tenant_present() {
        let mut q = CrudQuery::new(MESSAGE);
        q.tenant_id = Some("b1".into());
        let rendered = q.to_query(CrudView::spec(MESSAGE).unwrap());
        assert_eq!(
            tenant_constraint(&rendered),
            Some(&Constraint::Eq(values::pointer(BUSINESS, "b1")))
        );
    }

    #[test]
    fn tenant_filter_absent_for_missing_or_empty_tenant() {
        let spec = CrudView::spec(MESSAGE).unwrap();
        let mut q = CrudQuery::new(MESSAGE);
        assert!(tenant_constraint(&q.to_query(spec)).is_none());
        q.tenant_id = Some(String::new());
        assert!(tenant_constraint(&q.to_query(spec)).is_none());
    }

    #[test]
    fn unset_filters_are_skipped() {
        let mut q = CrudQuery::new(MESSAGE);
        q.filters.insert("direction".into(), json!("inbound"));
        q.filters.insert("psid".into(), json!(""));
        q.filters.insert("mid".into(), Value::Null);
        let rendered = q.to_query(CrudView::spec(MESSAGE).unwrap());
        assert_eq!(rendered.constraints.len(), 1);
        assert_eq!(rendered.constraints[0].0, "direction");
    }

    #[test]
    fn paging_translates_to_skip_and_limit() {
        let mut q = CrudQuery::new(MESSAGE);
        q.page = 3;
        q.page_size = 20;
        q.sort_field = Some("sentAt".into());
        q.sort_direction = SortDirection::Asc;
        let rendered = q.to_query(CrudView::spec(MESSAGE).unwrap());
        assert_eq!(rendered.skip, 40);
        assert_eq!(rendered.limit, Some(20));
        assert_eq!(rendered.order_param().as_deref(), Some("sentAt"));
        assert!(rendered.count);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let mut q = CrudQuery::new(MESSAGE);
        q.page = 0;
        assert_eq!(q.to_query(CrudView::spec(MESSAGE).unwrap()).skip, 0);
    }

    #[test]
    fn unknown_collection_is_not_found() {
        let err = CrudView::spec("_User").unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
    }
}
