//! Conversation model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

/// A row from the `Conversation` collection: one thread per contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    #[serde(default)]
    pub contact: Option<Pointer>,
    #[serde(default)]
    pub psid: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, with = "values::optional_date")]
    pub last_message_at: Option<Timestamp>,
    #[serde(default, with = "values::optional_date")]
    pub last_inbound_at: Option<Timestamp>,
    #[serde(default, with = "values::optional_date")]
    pub last_outbound_at: Option<Timestamp>,
    #[serde(default)]
    pub sla_breached: bool,
    #[serde(default, with = "values::optional_date")]
    pub sla_breached_at: Option<Timestamp>,
}

impl Conversation {
    /// True when the latest inbound message has no later outbound reply.
    pub fn awaiting_reply(&self) -> bool {
        match (self.last_inbound_at, self.last_outbound_at) {
            (Some(inbound), Some(outbound)) => outbound < inbound,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
