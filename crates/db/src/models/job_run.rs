//! Daily job ledger model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::ObjectId;

/// A row from the `JobRun` collection: one per job per Manila date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub object_id: ObjectId,
    pub job: String,
    /// `YYYY-MM-DD` in Manila time.
    pub run_date: String,
}
