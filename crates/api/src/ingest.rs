//! Processing of Facebook Page webhook deliveries.
//!
//! A delivery holds one `entry` per page. Each entry carries `messaging`
//! events (messages, echoes, postbacks, delivery/read receipts) and
//! `changes` (lead-ad submissions arrive as `field == "leadgen"`).
//! Every event is audited in `WebhookLog` before it is applied.

use chrono::{DateTime, Utc};
use pagepilot_core::types::{ObjectId, Timestamp};
use pagepilot_db::models::lead::{NewLead, SOURCE_LEAD_AD};
use pagepilot_db::models::message::{Direction, NewMessage};
use pagepilot_db::repositories::{
    BusinessRepo, ContactRepo, ConversationRepo, LeadRepo, MessageRepo, WebhookLogRepo,
};
use pagepilot_db::{Datastore, DbError};
use pagepilot_graph::GraphClient;
use serde::Deserialize;
use serde_json::Value;

/// `WebhookLog.source` for everything received here.
pub const SOURCE_FACEBOOK: &str = "facebook";

/// Channel recorded on contacts and messages.
pub const CHANNEL_MESSENGER: &str = "messenger";

/// Content stored for messages without text.
const ATTACHMENT_PLACEHOLDER: &str = "[attachment]";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    /// Page id.
    pub id: String,
    #[serde(default)]
    pub messaging: Vec<Value>,
    #[serde(default)]
    pub changes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Party {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Party,
    recipient: Party,
    /// Milliseconds since the epoch.
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<MessageBody>,
    #[serde(default)]
    postback: Option<Postback>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    mid: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    is_echo: bool,
}

#[derive(Debug, Deserialize)]
struct Postback {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Change {
    field: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct LeadgenValue {
    leadgen_id: String,
    #[serde(default)]
    form_id: Option<String>,
}

/// Counters for one delivery, logged by the handler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub processed: usize,
    pub failed: usize,
}

/// What a messaging event amounts to once classified.
#[derive(Debug, PartialEq)]
struct Inbound {
    direction: Direction,
    psid: String,
    content: String,
    mid: Option<String>,
    sent_at: Timestamp,
}

fn event_type(raw: &Value) -> &'static str {
    let is_echo = raw
        .pointer("/message/is_echo")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if is_echo {
        "echo"
    } else if raw.get("message").is_some() {
        "message"
    } else if raw.get("postback").is_some() {
        "postback"
    } else if raw.get("read").is_some() {
        "read"
    } else if raw.get("delivery").is_some() {
        "delivery"
    } else {
        "other"
    }
}

fn classify(event: MessagingEvent) -> Option<Inbound> {
    let sent_at = event
        .timestamp
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    if let Some(message) = event.message {
        let (direction, psid) = if message.is_echo {
            (Direction::Outbound, event.recipient.id)
        } else {
            (Direction::Inbound, event.sender.id)
        };
        return Some(Inbound {
            direction,
            psid,
            content: message
                .text
                .unwrap_or_else(|| ATTACHMENT_PLACEHOLDER.to_string()),
            mid: message.mid,
            sent_at,
        });
    }

    let postback = event.postback?;
    Some(Inbound {
        direction: Direction::Inbound,
        psid: event.sender.id,
        content: postback.title.or(postback.payload).unwrap_or_default(),
        mid: None,
        sent_at,
    })
}

/// Apply every event of `payload`. Individual failures are recorded on
/// their log row and counted; they never fail the delivery.
pub async fn ingest(
    store: &dyn Datastore,
    graph: Option<&GraphClient>,
    payload: WebhookPayload,
) -> IngestSummary {
    let mut summary = IngestSummary::default();

    for entry in payload.entry {
        let business_id = match BusinessRepo::find_by_page_id(store, &entry.id).await {
            Ok(business) => business.map(|b| b.object_id),
            Err(e) => {
                tracing::warn!(error = %e, page_id = %entry.id, "Business lookup failed");
                None
            }
        };
        if business_id.is_none() {
            tracing::debug!(page_id = %entry.id, "No business registered for page");
        }
        let business = business_id.as_deref();

        for raw in &entry.messaging {
            let result = audited(store, business, event_type(raw), raw, || {
                apply_messaging(store, business, raw)
            })
            .await;
            tally(&mut summary, result);
        }

        for raw in &entry.changes {
            let change: Change = match serde_json::from_value(raw.clone()) {
                Ok(change) => change,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed change event skipped");
                    continue;
                }
            };
            if change.field != "leadgen" {
                tracing::debug!(field = %change.field, "Ignoring change event");
                continue;
            }
            let result = audited(store, business, "leadgen", raw, || {
                apply_leadgen(store, graph, business, &change.value)
            })
            .await;
            tally(&mut summary, result);
        }
    }

    summary
}

fn tally(summary: &mut IngestSummary, result: Result<(), String>) {
    match result {
        Ok(()) => summary.processed += 1,
        Err(_) => summary.failed += 1,
    }
}

/// Log the event as `received`, run `apply`, then mark the log row.
async fn audited<F, Fut>(
    store: &dyn Datastore,
    business: Option<&str>,
    event_type: &str,
    raw: &Value,
    apply: F,
) -> Result<(), String>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let log_id = match WebhookLogRepo::create(store, business, SOURCE_FACEBOOK, event_type, raw)
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::error!(error = %e, event_type, "Failed to write webhook log");
            None
        }
    };

    let result = apply().await;

    if let Some(log_id) = log_id {
        let marked = match &result {
            Ok(()) => WebhookLogRepo::mark_processed(store, &log_id).await,
            Err(msg) => WebhookLogRepo::mark_error(store, &log_id, msg).await,
        };
        if let Err(e) = marked {
            tracing::error!(error = %e, log_id = %log_id, "Failed to update webhook log");
        }
    }
    if let Err(msg) = &result {
        tracing::warn!(error = %msg, event_type, "Webhook event failed");
    }
    result
}

async fn apply_messaging(
    store: &dyn Datastore,
    business: Option<&str>,
    raw: &Value,
) -> Result<(), String> {
    let event: MessagingEvent =
        serde_json::from_value(raw.clone()).map_err(|e| format!("Malformed messaging event: {e}"))?;
    let Some(inbound) = classify(event) else {
        // Delivery and read receipts carry nothing to store.
        return Ok(());
    };
    store_message(store, business, inbound)
        .await
        .map_err(|e| e.to_string())
}

async fn store_message(
    store: &dyn Datastore,
    business: Option<&str>,
    inbound: Inbound,
) -> Result<(), DbError> {
    if let Some(mid) = &inbound.mid {
        if MessageRepo::exists_with_mid(store, mid).await? {
            tracing::debug!(mid = %mid, "Duplicate delivery ignored");
            return Ok(());
        }
    }

    let contact_id = ContactRepo::upsert(
        store,
        business,
        &inbound.psid,
        CHANNEL_MESSENGER,
        inbound.sent_at,
    )
    .await?;
    let conversation = ConversationRepo::get_or_create(
        store,
        business,
        &contact_id,
        &inbound.psid,
        CHANNEL_MESSENGER,
    )
    .await?;

    MessageRepo::create(
        store,
        &NewMessage {
            business_id: business.map(String::from),
            conversation_id: conversation.object_id.clone(),
            contact_id,
            psid: inbound.psid,
            channel: CHANNEL_MESSENGER.to_string(),
            direction: inbound.direction,
            content: inbound.content,
            mid: inbound.mid,
            sent_at: inbound.sent_at,
        },
    )
    .await?;
    ConversationRepo::record_message(
        store,
        &conversation.object_id,
        inbound.direction,
        inbound.sent_at,
    )
    .await
}

async fn apply_leadgen(
    store: &dyn Datastore,
    graph: Option<&GraphClient>,
    business: Option<&str>,
    value: &Value,
) -> Result<(), String> {
    let leadgen: LeadgenValue = serde_json::from_value(value.clone())
        .map_err(|e| format!("Malformed leadgen change: {e}"))?;

    let existing = LeadRepo::find_by_leadgen_id(store, &leadgen.leadgen_id)
        .await
        .map_err(|e| e.to_string())?;
    if existing.is_some() {
        tracing::debug!(leadgen_id = %leadgen.leadgen_id, "Lead already recorded");
        return Ok(());
    }

    let mut lead = NewLead {
        business_id: business.map(String::from),
        source: SOURCE_LEAD_AD.to_string(),
        leadgen_id: Some(leadgen.leadgen_id.clone()),
        form_id: leadgen.form_id,
        ..NewLead::default()
    };

    if let Some(graph) = graph {
        match graph.fetch_lead(&leadgen.leadgen_id).await {
            Ok(data) => {
                lead.full_name = data.full_name();
                lead.email = data.email().map(String::from);
                lead.phone = data.phone().map(String::from);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    leadgen_id = %leadgen.leadgen_id,
                    "Lead enrichment failed, storing bare lead",
                );
            }
        }
    }

    let id: ObjectId = LeadRepo::create(store, &lead)
        .await
        .map_err(|e| e.to_string())?;
    tracing::info!(lead_id = %id, leadgen_id = %leadgen.leadgen_id, "Lead ad submission stored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(raw: Value) -> MessagingEvent {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn inbound_message_uses_sender_psid() {
        let inbound = classify(event(json!({
            "sender": {"id": "user-1"},
            "recipient": {"id": "page-1"},
            "timestamp": 1_700_000_000_000i64,
            "message": {"mid": "m.1", "text": "hi"}
        })))
        .unwrap();
        assert_eq!(inbound.direction, Direction::Inbound);
        assert_eq!(inbound.psid, "user-1");
        assert_eq!(inbound.content, "hi");
        assert_eq!(inbound.sent_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn echo_is_outbound_to_recipient() {
        let raw = json!({
            "sender": {"id": "page-1"},
            "recipient": {"id": "user-1"},
            "message": {"mid": "m.2", "text": "hello", "is_echo": true}
        });
        assert_eq!(event_type(&raw), "echo");
        let inbound = classify(event(raw)).unwrap();
        assert_eq!(inbound.direction, Direction::Outbound);
        assert_eq!(inbound.psid, "user-1");
    }

    #[test]
    fn attachment_only_message_gets_placeholder() {
        let inbound = classify(event(json!({
            "sender": {"id": "u"},
            "recipient": {"id": "p"},
            "message": {"mid": "m.3", "attachments": [{"type": "image"}]}
        })))
        .unwrap();
        assert_eq!(inbound.content, ATTACHMENT_PLACEHOLDER);
    }

    #[test]
    fn postback_stores_title() {
        let inbound = classify(event(json!({
            "sender": {"id": "u"},
            "recipient": {"id": "p"},
            "postback": {"title": "Get Started", "payload": "GET_STARTED"}
        })))
        .unwrap();
        assert_eq!(inbound.content, "Get Started");
    }

    #[test]
    fn receipts_are_not_messages() {
        let raw = json!({
            "sender": {"id": "u"},
            "recipient": {"id": "p"},
            "read": {"watermark": 1}
        });
        assert_eq!(event_type(&raw), "read");
        assert!(classify(event(raw)).is_none());
    }
}
