//! Repository for the `MessengerContact` collection.

use pagepilot_core::collections::{BUSINESS, MESSENGER_CONTACT, TENANT_FIELD};
use pagepilot_core::types::{ObjectId, Record, Timestamp};
use serde_json::{json, Value};

use crate::error::DbError;
use crate::models::contact::MessengerContact;
use crate::models::{from_row, from_rows};
use crate::query::{Query, SortDirection};
use crate::repositories::set_business;
use crate::store::Datastore;
use crate::values;

pub struct ContactRepo;

impl ContactRepo {
    pub async fn find_by_psid(
        store: &dyn Datastore,
        business_id: Option<&str>,
        psid: &str,
    ) -> Result<Option<MessengerContact>, DbError> {
        let mut query = Query::new().eq("psid", json!(psid));
        if let Some(id) = business_id {
            query = query.eq(TENANT_FIELD, values::pointer(BUSINESS, id));
        }
        store
            .first(MESSENGER_CONTACT, query)
            .await?
            .map(from_row)
            .transpose()
    }

    /// Insert the contact if unseen, otherwise bump `lastInteractionAt`.
    /// Returns the contact id.
    pub async fn upsert(
        store: &dyn Datastore,
        business_id: Option<&str>,
        psid: &str,
        channel: &str,
        at: Timestamp,
    ) -> Result<ObjectId, DbError> {
        let mut patch = Record::new();
        patch.insert("lastInteractionAt".into(), values::date(at));

        if let Some(existing) = Self::find_by_psid(store, business_id, psid).await? {
            store
                .update(MESSENGER_CONTACT, &existing.object_id, patch)
                .await?;
            return Ok(existing.object_id);
        }

        patch.insert("psid".into(), json!(psid));
        patch.insert("channel".into(), json!(channel));
        patch.insert("optedOut".into(), Value::Bool(false));
        set_business(&mut patch, business_id);
        let id = store.create(MESSENGER_CONTACT, patch).await?;
        tracing::info!(contact_id = %id, psid, "New messenger contact");
        Ok(id)
    }

    /// Contacts idle since before `cutoff` that were never re-engaged and
    /// have not opted out, oldest first.
    pub async fn reengagement_candidates(
        store: &dyn Datastore,
        cutoff: Timestamp,
        limit: u32,
    ) -> Result<Vec<MessengerContact>, DbError> {
        let query = Query::new()
            .lt("lastInteractionAt", values::date(cutoff))
            .exists("reengagedAt", false)
            .ne("optedOut", Value::Bool(true))
            .order_by("lastInteractionAt", SortDirection::Asc)
            .limit(limit);
        from_rows(store.find(MESSENGER_CONTACT, &query).await?.results)
    }

    pub async fn mark_reengaged(
        store: &dyn Datastore,
        id: &str,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("reengagedAt".into(), values::date(at));
        store.update(MESSENGER_CONTACT, id, patch).await
    }
}
