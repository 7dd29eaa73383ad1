//! Repository layer: typed operations over the datastore collections.
//!
//! Each repository is a zero-sized struct with async associated functions
//! taking a `&dyn Datastore`.

pub mod business_repo;
pub mod contact_repo;
pub mod conversation_repo;
pub mod job_run_repo;
pub mod lead_repo;
pub mod message_repo;
pub mod nurture_repo;
pub mod scheduled_action_repo;
pub mod webhook_log_repo;

pub use business_repo::BusinessRepo;
pub use contact_repo::ContactRepo;
pub use conversation_repo::ConversationRepo;
pub use job_run_repo::JobRunRepo;
pub use lead_repo::LeadRepo;
pub use message_repo::MessageRepo;
pub use nurture_repo::NurtureRepo;
pub use scheduled_action_repo::ScheduledActionRepo;
pub use webhook_log_repo::WebhookLogRepo;

use pagepilot_core::collections::{BUSINESS, TENANT_FIELD};
use pagepilot_core::types::Record;
use serde_json::Value;

use crate::values;

/// Set the tenant pointer on a new row when a business is known.
pub(crate) fn set_business(record: &mut Record, business_id: Option<&str>) {
    if let Some(id) = business_id.filter(|id| !id.is_empty()) {
        record.insert(TENANT_FIELD.to_string(), values::pointer(BUSINESS, id));
    }
}

/// Insert `value` under `key` when present.
pub(crate) fn set_opt(record: &mut Record, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        record.insert(key.to_string(), Value::String(v.to_string()));
    }
}
