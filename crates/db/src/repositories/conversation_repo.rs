//! Repository for the `Conversation` collection.

use pagepilot_core::collections::{CONVERSATION, MESSENGER_CONTACT};
use pagepilot_core::types::{Record, Timestamp};
use serde_json::{json, Value};

use crate::error::DbError;
use crate::models::conversation::Conversation;
use crate::models::message::Direction;
use crate::models::{from_row, from_rows};
use crate::query::{Query, SortDirection};
use crate::repositories::set_business;
use crate::store::Datastore;
use crate::values;

/// Set on inbound messages, cleared by outbound replies.
pub const AWAITING_REPLY: &str = "awaitingReply";

pub struct ConversationRepo;

impl ConversationRepo {
    /// The contact's conversation, created on first contact.
    pub async fn get_or_create(
        store: &dyn Datastore,
        business_id: Option<&str>,
        contact_id: &str,
        psid: &str,
        channel: &str,
    ) -> Result<Conversation, DbError> {
        let query = Query::new().eq("contact", values::pointer(MESSENGER_CONTACT, contact_id));
        if let Some(row) = store.first(CONVERSATION, query).await? {
            return from_row(row);
        }

        let mut fields = Record::new();
        fields.insert("contact".into(), values::pointer(MESSENGER_CONTACT, contact_id));
        fields.insert("psid".into(), json!(psid));
        fields.insert("channel".into(), json!(channel));
        fields.insert("slaBreached".into(), Value::Bool(false));
        fields.insert(AWAITING_REPLY.into(), Value::Bool(false));
        set_business(&mut fields, business_id);
        let id = store.create(CONVERSATION, fields).await?;
        tracing::debug!(conversation_id = %id, contact_id, "Conversation created");

        store
            .get(CONVERSATION, &id)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| DbError::Decode(format!("Conversation {id} vanished after create")))
    }

    /// Update the thread timestamps for a new message. An inbound message
    /// leaves the thread awaiting a reply; an outbound reply clears that and
    /// any open SLA breach.
    pub async fn record_message(
        store: &dyn Datastore,
        id: &str,
        direction: Direction,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("lastMessageAt".into(), values::date(at));
        match direction {
            Direction::Inbound => {
                patch.insert("lastInboundAt".into(), values::date(at));
                patch.insert(AWAITING_REPLY.into(), Value::Bool(true));
            }
            Direction::Outbound => {
                patch.insert("lastOutboundAt".into(), values::date(at));
                patch.insert("slaBreached".into(), Value::Bool(false));
                patch.insert(AWAITING_REPLY.into(), Value::Bool(false));
            }
        }
        store.update(CONVERSATION, id, patch).await
    }

    /// Unflagged conversations whose latest inbound message is older than
    /// `cutoff` and still has no reply.
    ///
    /// Answered threads are excluded in the query itself, so they can never
    /// crowd waiting ones out of the result limit.
    pub async fn sla_candidates(
        store: &dyn Datastore,
        cutoff: Timestamp,
    ) -> Result<Vec<Conversation>, DbError> {
        let query = Query::new()
            .lte("lastInboundAt", values::date(cutoff))
            .eq(AWAITING_REPLY, Value::Bool(true))
            .ne("slaBreached", Value::Bool(true))
            .order_by("lastInboundAt", SortDirection::Asc)
            .limit(crate::query::MAX_LIMIT);
        let rows: Vec<Conversation> = from_rows(store.find(CONVERSATION, &query).await?.results)?;
        Ok(rows.into_iter().filter(Conversation::awaiting_reply).collect())
    }

    pub async fn mark_breached(
        store: &dyn Datastore,
        id: &str,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("slaBreached".into(), Value::Bool(true));
        patch.insert("slaBreachedAt".into(), values::date(at));
        store.update(CONVERSATION, id, patch).await
    }

    /// Number of conversations currently flagged as breached.
    pub async fn count_open_breaches(store: &dyn Datastore) -> Result<u64, DbError> {
        store
            .count(CONVERSATION, Query::new().eq("slaBreached", Value::Bool(true)))
            .await
    }
}
