//! Nurture sequence and enrollment models.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

/// One drip step: wait `delay_hours` after the previous step, then send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurtureStep {
    #[serde(default)]
    pub delay_hours: f64,
    pub message: String,
}

/// A row from the `NurtureSequence` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurtureSequence {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub steps: Vec<NurtureStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A row from the `NurtureEnrollment` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurtureEnrollment {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    #[serde(default)]
    pub sequence: Option<Pointer>,
    pub psid: String,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default, with = "values::optional_date")]
    pub next_send_at: Option<Timestamp>,
    pub status: EnrollmentStatus,
    #[serde(default, with = "values::optional_date")]
    pub completed_at: Option<Timestamp>,
}
