//! Repository for the `FbLead` collection.
//!
//! Every lead write in the workspace goes through here (or through
//! [`LeadRepo::prepare_update`]) so the `stageChangedAt` rule holds no
//! matter which process changes the stage.

use pagepilot_core::collections::FB_LEAD;
use pagepilot_core::error::CoreError;
use pagepilot_core::pipeline::{
    apply_stage_transition, PipelineStage, STAGE_CHANGED_AT_FIELD, STAGE_FIELD,
};
use pagepilot_core::types::{ObjectId, Record, Timestamp};
use serde_json::{json, Value};

use crate::error::DbError;
use crate::models::from_row;
use crate::models::lead::{FbLead, NewLead};
use crate::query::Query;
use crate::repositories::{set_business, set_opt};
use crate::store::Datastore;
use crate::values;

pub struct LeadRepo;

impl LeadRepo {
    /// Insert a lead in stage `inquiry`, stamping `stageChangedAt`.
    pub async fn create(store: &dyn Datastore, input: &NewLead) -> Result<ObjectId, DbError> {
        let mut fields = Record::new();
        fields.insert("source".into(), json!(input.source));
        fields.insert(STAGE_FIELD.into(), json!(PipelineStage::Inquiry.as_str()));
        fields.insert(STAGE_CHANGED_AT_FIELD.into(), values::now());
        set_opt(&mut fields, "fullName", input.full_name.as_deref());
        set_opt(&mut fields, "email", input.email.as_deref());
        set_opt(&mut fields, "phone", input.phone.as_deref());
        set_opt(&mut fields, "leadgenId", input.leadgen_id.as_deref());
        set_opt(&mut fields, "formId", input.form_id.as_deref());
        set_opt(&mut fields, "placeId", input.place_id.as_deref());
        set_opt(&mut fields, "tier", input.tier.as_deref());
        set_opt(&mut fields, "region", input.region.as_deref());
        if let Some(score) = input.lead_score {
            fields.insert("leadScore".into(), json!(score));
        }
        set_business(&mut fields, input.business_id.as_deref());

        let id = store.create(FB_LEAD, fields).await?;
        tracing::info!(lead_id = %id, source = %input.source, "Lead created");
        Ok(id)
    }

    pub async fn find_by_id(store: &dyn Datastore, id: &str) -> Result<Option<FbLead>, DbError> {
        store.get(FB_LEAD, id).await?.map(from_row).transpose()
    }

    pub async fn find_by_place_id(
        store: &dyn Datastore,
        place_id: &str,
    ) -> Result<Option<FbLead>, DbError> {
        let query = Query::new().eq("placeId", json!(place_id));
        store.first(FB_LEAD, query).await?.map(from_row).transpose()
    }

    pub async fn find_by_leadgen_id(
        store: &dyn Datastore,
        leadgen_id: &str,
    ) -> Result<Option<FbLead>, DbError> {
        let query = Query::new().eq("leadgenId", json!(leadgen_id));
        store.first(FB_LEAD, query).await?.map(from_row).transpose()
    }

    /// Apply the stage-transition rule to `patch` against the stored row.
    ///
    /// Fails with `NotFound` when the lead does not exist and with
    /// `Validation` for unknown stage names. Returns whether the stage
    /// changed.
    pub async fn prepare_update(
        store: &dyn Datastore,
        id: &str,
        patch: &mut Record,
    ) -> Result<bool, DbError> {
        // Clients never set the timestamp themselves.
        patch.remove(STAGE_CHANGED_AT_FIELD);
        if !patch.contains_key(STAGE_FIELD) {
            return Ok(false);
        }
        let current = store.get(FB_LEAD, id).await?.ok_or_else(|| CoreError::NotFound {
            entity: "FbLead",
            id: id.to_string(),
        })?;
        let current_stage = current.get(STAGE_FIELD).and_then(Value::as_str);
        Ok(apply_stage_transition(current_stage, patch, values::now())?)
    }

    /// Patch a lead, enforcing the stage-transition rule.
    pub async fn update(
        store: &dyn Datastore,
        id: &str,
        mut patch: Record,
    ) -> Result<bool, DbError> {
        let changed = Self::prepare_update(store, id, &mut patch).await?;
        if changed {
            let stage = patch.get(STAGE_FIELD).and_then(Value::as_str).unwrap_or_default();
            tracing::info!(lead_id = %id, stage, "Lead stage changed");
        }
        store.update(FB_LEAD, id, patch).await?;
        Ok(changed)
    }

    pub async fn update_stage(
        store: &dyn Datastore,
        id: &str,
        stage: PipelineStage,
    ) -> Result<bool, DbError> {
        let mut patch = Record::new();
        patch.insert(STAGE_FIELD.into(), json!(stage.as_str()));
        Self::update(store, id, patch).await
    }

    pub async fn count_since(store: &dyn Datastore, since: Timestamp) -> Result<u64, DbError> {
        let query = Query::new().gte("createdAt", values::date(since));
        store.count(FB_LEAD, query).await
    }
}
