//! Repository for the `ScheduledAction` collection.

use pagepilot_core::collections::SCHEDULED_ACTION;
use pagepilot_core::types::{Record, Timestamp};
use serde_json::json;

use crate::error::DbError;
use crate::models::from_rows;
use crate::models::scheduled_action::{ActionStatus, ScheduledAction};
use crate::query::{Query, SortDirection};
use crate::store::Datastore;
use crate::values;

pub struct ScheduledActionRepo;

impl ScheduledActionRepo {
    /// Pending actions with `runAt <= now`, earliest first.
    pub async fn due(
        store: &dyn Datastore,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<ScheduledAction>, DbError> {
        let query = Query::new()
            .eq("status", json!(ActionStatus::Pending.as_str()))
            .lte("runAt", values::date(now))
            .order_by("runAt", SortDirection::Asc)
            .limit(limit);
        from_rows(store.find(SCHEDULED_ACTION, &query).await?.results)
    }

    pub async fn mark_done(store: &dyn Datastore, id: &str, at: Timestamp) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("status".into(), json!(ActionStatus::Done.as_str()));
        patch.insert("executedAt".into(), values::date(at));
        store.update(SCHEDULED_ACTION, id, patch).await
    }

    pub async fn mark_failed(
        store: &dyn Datastore,
        id: &str,
        error: &str,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("status".into(), json!(ActionStatus::Failed.as_str()));
        patch.insert("error".into(), json!(error));
        patch.insert("executedAt".into(), values::date(at));
        store.update(SCHEDULED_ACTION, id, patch).await
    }
}
