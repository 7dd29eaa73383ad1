//! Deferred actions stored in `ScheduledAction`.
//!
//! Supported action types:
//!
//! | `actionType`        | `payload`                          |
//! |---------------------|------------------------------------|
//! | `send_message`      | `{"psid": "...", "message": "..."}` |
//! | `update_lead_stage` | `{"leadId": "...", "stage": "..."}` |

use async_trait::async_trait;
use pagepilot_core::pipeline::PipelineStage;
use pagepilot_core::types::Timestamp;
use pagepilot_db::models::scheduled_action::ScheduledAction;
use pagepilot_db::repositories::{LeadRepo, ScheduledActionRepo};
use serde::Deserialize;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};

const BATCH_SIZE: u32 = 100;

pub struct ScheduledActions;

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    psid: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLeadStagePayload {
    lead_id: String,
    stage: String,
}

fn payload<T: serde::de::DeserializeOwned>(action: &ScheduledAction) -> Result<T, JobError> {
    serde_json::from_value(action.payload.clone()).map_err(|e| {
        JobError::InvalidAction(format!("{} payload: {e}", action.action_type))
    })
}

async fn execute(ctx: &JobContext, action: &ScheduledAction) -> Result<(), JobError> {
    match action.action_type.as_str() {
        "send_message" => {
            let p: SendMessagePayload = payload(action)?;
            ctx.sender.send_text(&p.psid, &p.message).await?;
        }
        "update_lead_stage" => {
            let p: UpdateLeadStagePayload = payload(action)?;
            let stage: PipelineStage = p
                .stage
                .parse()
                .map_err(|e: pagepilot_core::error::CoreError| JobError::InvalidAction(e.to_string()))?;
            LeadRepo::update_stage(ctx.store.as_ref(), &p.lead_id, stage).await?;
        }
        other => {
            return Err(JobError::InvalidAction(format!("unknown action type '{other}'")));
        }
    }
    Ok(())
}

#[async_trait]
impl Job for ScheduledActions {
    fn name(&self) -> &'static str {
        "scheduled_actions"
    }

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError> {
        let store = ctx.store.as_ref();
        let due = ScheduledActionRepo::due(store, now, BATCH_SIZE).await?;
        let mut report = JobReport::default();

        for action in &due {
            let status_write = match execute(ctx, action).await {
                Ok(()) => {
                    report.processed += 1;
                    ScheduledActionRepo::mark_done(store, &action.object_id, now).await
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        action_id = %action.object_id,
                        action_type = %action.action_type,
                        "Scheduled action failed",
                    );
                    report.failed += 1;
                    ScheduledActionRepo::mark_failed(store, &action.object_id, &e.to_string(), now)
                        .await
                }
            };
            if let Err(e) = status_write {
                tracing::error!(
                    error = %e,
                    action_id = %action.object_id,
                    "Failed to record scheduled action status",
                );
                report.failed += 1;
            }
        }
        Ok(report)
    }
}
