//! Message model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

/// A row from the `Message` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    #[serde(default)]
    pub conversation: Option<Pointer>,
    #[serde(default)]
    pub contact: Option<Pointer>,
    #[serde(default)]
    pub psid: String,
    pub direction: Direction,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default, with = "values::optional_date")]
    pub sent_at: Option<Timestamp>,
}

/// Input for inserting a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub business_id: Option<ObjectId>,
    pub conversation_id: ObjectId,
    pub contact_id: ObjectId,
    pub psid: String,
    pub channel: String,
    pub direction: Direction,
    pub content: String,
    pub mid: Option<String>,
    pub sent_at: Timestamp,
}
