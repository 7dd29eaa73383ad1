//! Re-engagement sweep for contacts who went quiet.

use async_trait::async_trait;
use chrono::Duration;
use pagepilot_core::types::Timestamp;
use pagepilot_db::repositories::ContactRepo;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};

/// Contacts messaged per sweep.
pub const BATCH_LIMIT: u32 = 50;

pub struct Reengagement;

fn personalize(template: &str, first_name: Option<&str>) -> String {
    let name = first_name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("there");
    template.replace("{first_name}", name)
}

#[async_trait]
impl Job for Reengagement {
    fn name(&self) -> &'static str {
        "reengagement"
    }

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError> {
        let store = ctx.store.as_ref();
        let cutoff = now - Duration::days(ctx.config.reengage_after_days);
        let contacts = ContactRepo::reengagement_candidates(store, cutoff, BATCH_LIMIT).await?;
        let mut report = JobReport::default();

        for contact in &contacts {
            let text = personalize(&ctx.config.reengage_message, contact.first_name.as_deref());
            let result = async {
                ctx.sender.send_text(&contact.psid, &text).await?;
                ContactRepo::mark_reengaged(store, &contact.object_id, now).await?;
                Ok::<_, JobError>(())
            }
            .await;
            match result {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    tracing::error!(error = %e, contact_id = %contact.object_id, "Re-engagement failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personalize_falls_back_to_there() {
        assert_eq!(personalize("Hi {first_name}!", Some("Ana")), "Hi Ana!");
        assert_eq!(personalize("Hi {first_name}!", Some("  ")), "Hi there!");
        assert_eq!(personalize("Hi {first_name}!", None), "Hi there!");
    }
}
