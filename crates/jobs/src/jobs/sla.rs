//! SLA compliance check.
//!
//! Flags conversations whose latest inbound message has waited longer than
//! `SLA_MINUTES` without a reply, then sends admins a single summary.

use async_trait::async_trait;
use chrono::Duration;
use pagepilot_core::types::Timestamp;
use pagepilot_db::repositories::ConversationRepo;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};

pub struct SlaCheck;

pub(crate) fn alert_text(flagged: usize, sla_minutes: i64) -> String {
    format!(
        "SLA alert: {flagged} conversation(s) waiting more than {sla_minutes} minutes for a reply."
    )
}

#[async_trait]
impl Job for SlaCheck {
    fn name(&self) -> &'static str {
        "sla_check"
    }

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError> {
        let store = ctx.store.as_ref();
        let cutoff = now - Duration::minutes(ctx.config.sla_minutes);
        let candidates = ConversationRepo::sla_candidates(store, cutoff).await?;
        let mut report = JobReport::default();

        for conversation in &candidates {
            match ConversationRepo::mark_breached(store, &conversation.object_id, now).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        conversation_id = %conversation.object_id,
                        "Failed to flag SLA breach",
                    );
                    report.failed += 1;
                }
            }
        }

        if report.processed > 0 {
            tracing::warn!(flagged = report.processed, "SLA breaches flagged");
            ctx.notify_admins(&alert_text(report.processed, ctx.config.sla_minutes))
                .await;
        }
        Ok(report)
    }
}
