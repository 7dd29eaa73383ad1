//! Repository for the `WebhookLog` audit trail.

use pagepilot_core::collections::WEBHOOK_LOG;
use pagepilot_core::types::{ObjectId, Record};
use serde_json::{json, Value};

use crate::error::DbError;
use crate::models::webhook_log::WebhookStatus;
use crate::repositories::set_business;
use crate::store::Datastore;

pub struct WebhookLogRepo;

impl WebhookLogRepo {
    /// Record an inbound event with status `received`.
    pub async fn create(
        store: &dyn Datastore,
        business_id: Option<&str>,
        source: &str,
        event_type: &str,
        payload: &Value,
    ) -> Result<ObjectId, DbError> {
        let mut fields = Record::new();
        fields.insert("source".into(), json!(source));
        fields.insert("eventType".into(), json!(event_type));
        fields.insert("payload".into(), payload.clone());
        fields.insert("status".into(), json!(WebhookStatus::Received.as_str()));
        set_business(&mut fields, business_id);
        store.create(WEBHOOK_LOG, fields).await
    }

    pub async fn mark_processed(store: &dyn Datastore, id: &str) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("status".into(), json!(WebhookStatus::Processed.as_str()));
        store.update(WEBHOOK_LOG, id, patch).await
    }

    pub async fn mark_error(store: &dyn Datastore, id: &str, error: &str) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("status".into(), json!(WebhookStatus::Error.as_str()));
        patch.insert("error".into(), json!(error));
        store.update(WEBHOOK_LOG, id, patch).await
    }
}
