//! Collection names and field descriptors for the hosted datastore.
//!
//! The datastore is schema-less; these descriptors are the conventions the
//! dashboard, webhook ingress and jobs agree on. Field kinds drive rendering
//! (see [`crate::masking`]) and nothing else: no server-side validation.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Collection names
// ---------------------------------------------------------------------------

pub const BUSINESS: &str = "Business";
pub const MESSENGER_CONTACT: &str = "MessengerContact";
pub const CONVERSATION: &str = "Conversation";
pub const MESSAGE: &str = "Message";
pub const FB_LEAD: &str = "FbLead";
pub const NURTURE_SEQUENCE: &str = "NurtureSequence";
pub const NURTURE_ENROLLMENT: &str = "NurtureEnrollment";
pub const SCHEDULED_ACTION: &str = "ScheduledAction";
pub const TOKEN_STORE: &str = "TokenStore";
pub const WEBHOOK_LOG: &str = "WebhookLog";
pub const JOB_RUN: &str = "JobRun";

/// Pointer field carried by every tenant-scoped collection.
pub const TENANT_FIELD: &str = "business";

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// How a field is rendered in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    Json,
    Pointer,
    /// Rendered as `****` plus the last four characters.
    Masked,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CollectionSpec {
    pub name: &'static str,
    /// Whether rows carry a `business` pointer.
    pub tenant_scoped: bool,
    pub fields: &'static [FieldSpec],
}

impl CollectionSpec {
    /// Look up a field descriptor by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate over the fields rendered as masked values.
    pub fn masked_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Masked)
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

use FieldKind::{Boolean, Date, Json, Masked, Number, Pointer, Text};

/// Every collection the dashboard may query.
pub static COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: BUSINESS,
        tenant_scoped: false,
        fields: &[
            field("name", Text),
            field("slug", Text),
            field("facebookPageId", Text),
            field("instagramId", Text),
            field("catalogId", Text),
        ],
    },
    CollectionSpec {
        name: MESSENGER_CONTACT,
        tenant_scoped: true,
        fields: &[
            field("psid", Text),
            field("channel", Text),
            field("firstName", Text),
            field("lastName", Text),
            field("lastInteractionAt", Date),
            field("reengagedAt", Date),
            field("optedOut", Boolean),
        ],
    },
    CollectionSpec {
        name: CONVERSATION,
        tenant_scoped: true,
        fields: &[
            field("contact", Pointer),
            field("psid", Text),
            field("channel", Text),
            field("lastMessageAt", Date),
            field("lastInboundAt", Date),
            field("lastOutboundAt", Date),
            field("awaitingReply", Boolean),
            field("slaBreached", Boolean),
            field("slaBreachedAt", Date),
        ],
    },
    CollectionSpec {
        name: MESSAGE,
        tenant_scoped: true,
        fields: &[
            field("conversation", Pointer),
            field("contact", Pointer),
            field("psid", Text),
            field("channel", Text),
            field("direction", Text),
            field("content", Text),
            field("mid", Text),
            field("sentAt", Date),
        ],
    },
    CollectionSpec {
        name: FB_LEAD,
        tenant_scoped: true,
        fields: &[
            field("fullName", Text),
            field("email", Text),
            field("phone", Text),
            field("source", Text),
            field("leadgenId", Text),
            field("formId", Text),
            field("placeId", Text),
            field("pipelineStage", Text),
            field("stageChangedAt", Date),
            field("leadScore", Number),
            field("tier", Text),
            field("region", Text),
        ],
    },
    CollectionSpec {
        name: NURTURE_SEQUENCE,
        tenant_scoped: true,
        fields: &[
            field("name", Text),
            field("isActive", Boolean),
            field("steps", Json),
        ],
    },
    CollectionSpec {
        name: NURTURE_ENROLLMENT,
        tenant_scoped: true,
        fields: &[
            field("sequence", Pointer),
            field("psid", Text),
            field("currentStep", Number),
            field("nextSendAt", Date),
            field("status", Text),
            field("completedAt", Date),
        ],
    },
    CollectionSpec {
        name: SCHEDULED_ACTION,
        tenant_scoped: true,
        fields: &[
            field("actionType", Text),
            field("payload", Json),
            field("runAt", Date),
            field("status", Text),
            field("error", Text),
            field("executedAt", Date),
        ],
    },
    CollectionSpec {
        name: TOKEN_STORE,
        tenant_scoped: true,
        fields: &[
            field("platform", Text),
            field("accessToken", Masked),
            field("expiresAt", Date),
        ],
    },
    CollectionSpec {
        name: WEBHOOK_LOG,
        tenant_scoped: true,
        fields: &[
            field("source", Text),
            field("eventType", Text),
            field("payload", Json),
            field("status", Text),
            field("error", Text),
        ],
    },
    CollectionSpec {
        name: JOB_RUN,
        tenant_scoped: false,
        fields: &[
            field("job", Text),
            field("runDate", Text),
            field("claimedAt", Date),
        ],
    },
];

/// Find a collection descriptor by its datastore class name.
pub fn find(name: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_known_collection() {
        let spec = find(FB_LEAD).unwrap();
        assert!(spec.tenant_scoped);
        assert_eq!(spec.field("pipelineStage").unwrap().kind, FieldKind::Text);
    }

    #[test]
    fn find_unknown_collection() {
        assert!(find("_User").is_none());
    }

    #[test]
    fn token_store_masks_access_token() {
        let spec = find(TOKEN_STORE).unwrap();
        let masked: Vec<_> = spec.masked_fields().map(|f| f.name).collect();
        assert_eq!(masked, vec!["accessToken"]);
    }

    #[test]
    fn collection_names_are_unique() {
        let mut names: Vec<_> = COLLECTIONS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COLLECTIONS.len());
    }
}
