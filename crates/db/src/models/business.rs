//! Business (tenant) model.

use serde::{Deserialize, Serialize};

use pagepilot_core::types::ObjectId;

/// A row from the `Business` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub object_id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Facebook page id; webhook entries are routed to the tenant by it.
    #[serde(default)]
    pub facebook_page_id: Option<String>,
    #[serde(default)]
    pub instagram_id: Option<String>,
    #[serde(default)]
    pub catalog_id: Option<String>,
}
