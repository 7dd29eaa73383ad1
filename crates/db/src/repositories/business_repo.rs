//! Repository for the `Business` collection.

use pagepilot_core::collections::BUSINESS;
use serde_json::json;

use crate::error::DbError;
use crate::models::business::Business;
use crate::models::{from_row, from_rows};
use crate::query::{Query, SortDirection};
use crate::store::Datastore;

pub struct BusinessRepo;

impl BusinessRepo {
    pub async fn find_by_id(store: &dyn Datastore, id: &str) -> Result<Option<Business>, DbError> {
        store.get(BUSINESS, id).await?.map(from_row).transpose()
    }

    /// Resolve the tenant owning a Facebook page.
    pub async fn find_by_page_id(
        store: &dyn Datastore,
        page_id: &str,
    ) -> Result<Option<Business>, DbError> {
        let query = Query::new().eq("facebookPageId", json!(page_id));
        store.first(BUSINESS, query).await?.map(from_row).transpose()
    }

    pub async fn list(store: &dyn Datastore) -> Result<Vec<Business>, DbError> {
        let query = Query::new().order_by("name", SortDirection::Asc);
        from_rows(store.find(BUSINESS, &query).await?.results)
    }
}
