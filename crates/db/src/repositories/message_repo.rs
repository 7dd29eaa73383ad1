//! Repository for the `Message` collection.

use pagepilot_core::collections::{CONVERSATION, MESSAGE, MESSENGER_CONTACT};
use pagepilot_core::types::{ObjectId, Record, Timestamp};
use serde_json::json;

use crate::error::DbError;
use crate::models::from_rows;
use crate::models::message::{Direction, Message, NewMessage};
use crate::query::{Query, SortDirection};
use crate::repositories::{set_business, set_opt};
use crate::store::Datastore;
use crate::values;

pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(store: &dyn Datastore, input: &NewMessage) -> Result<ObjectId, DbError> {
        let mut fields = Record::new();
        fields.insert(
            "conversation".into(),
            values::pointer(CONVERSATION, &input.conversation_id),
        );
        fields.insert(
            "contact".into(),
            values::pointer(MESSENGER_CONTACT, &input.contact_id),
        );
        fields.insert("psid".into(), json!(input.psid));
        fields.insert("channel".into(), json!(input.channel));
        fields.insert("direction".into(), json!(input.direction.as_str()));
        fields.insert("content".into(), json!(input.content));
        fields.insert("sentAt".into(), values::date(input.sent_at));
        set_opt(&mut fields, "mid", input.mid.as_deref());
        set_business(&mut fields, input.business_id.as_deref());
        store.create(MESSAGE, fields).await
    }

    /// Whether a message with this Messenger `mid` is already stored.
    /// Facebook redelivers events it did not see acknowledged.
    pub async fn exists_with_mid(store: &dyn Datastore, mid: &str) -> Result<bool, DbError> {
        Ok(store
            .first(MESSAGE, Query::new().eq("mid", json!(mid)))
            .await?
            .is_some())
    }

    /// Messages of a conversation, oldest first.
    pub async fn list_for_conversation(
        store: &dyn Datastore,
        conversation_id: &str,
    ) -> Result<Vec<Message>, DbError> {
        let query = Query::new()
            .eq("conversation", values::pointer(CONVERSATION, conversation_id))
            .order_by("sentAt", SortDirection::Asc);
        from_rows(store.find(MESSAGE, &query).await?.results)
    }

    pub async fn count_since(
        store: &dyn Datastore,
        direction: Direction,
        since: Timestamp,
    ) -> Result<u64, DbError> {
        let query = Query::new()
            .eq("direction", json!(direction.as_str()))
            .gte("sentAt", values::date(since));
        store.count(MESSAGE, query).await
    }
}
