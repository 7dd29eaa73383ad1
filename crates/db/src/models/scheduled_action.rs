//! Scheduled action model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Done,
    Failed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// A row from the `ScheduledAction` collection.
///
/// `action_type` stays a string so unknown types can be reported as a
/// failed action instead of a decode error for the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAction {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, with = "values::optional_date")]
    pub run_at: Option<Timestamp>,
    pub status: ActionStatus,
}
