//! Lead model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::{ObjectId, Timestamp};

use crate::values::{self, Pointer};

/// Lead source for Messenger lead-ad submissions.
pub const SOURCE_LEAD_AD: &str = "facebook_lead_ad";

/// Lead source for scouted map listings.
pub const SOURCE_MAPS: &str = "maps";

/// A row from the `FbLead` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FbLead {
    pub object_id: ObjectId,
    #[serde(default)]
    pub business: Option<Pointer>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub leadgen_id: Option<String>,
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    /// Kept as a string: rows written by other tools may carry stages this
    /// code does not know.
    #[serde(default)]
    pub pipeline_stage: Option<String>,
    #[serde(default, with = "values::optional_date")]
    pub stage_changed_at: Option<Timestamp>,
    #[serde(default)]
    pub lead_score: Option<u32>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, with = "values::optional_date")]
    pub created_at: Option<Timestamp>,
}

/// Input for creating a lead. New leads always start in `inquiry`.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub business_id: Option<ObjectId>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub leadgen_id: Option<String>,
    pub form_id: Option<String>,
    pub place_id: Option<String>,
    pub lead_score: Option<u32>,
    pub tier: Option<String>,
    pub region: Option<String>,
}
