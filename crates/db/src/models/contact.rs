//! Messenger contact model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

/// A row from the `MessengerContact` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerContact {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    pub psid: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, with = "values::optional_date")]
    pub last_interaction_at: Option<Timestamp>,
    #[serde(default, with = "values::optional_date")]
    pub reengaged_at: Option<Timestamp>,
    #[serde(default)]
    pub opted_out: bool,
}

impl MessengerContact {
    pub fn business_id(&self) -> Option<&str> {
        self.business.as_ref().map(|p| p.object_id.as_str())
    }
}
