//! Daily admin digest: activity over the past 24 hours.

use async_trait::async_trait;
use chrono::Duration;
use pagepilot_core::schedule::manila;
use pagepilot_core::types::Timestamp;
use pagepilot_db::models::message::Direction;
use pagepilot_db::repositories::{ConversationRepo, LeadRepo, MessageRepo};

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};

pub struct DailyDigest;

/// Counts reported in the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestCounts {
    pub new_leads: u64,
    pub inbound_messages: u64,
    pub outbound_messages: u64,
    pub open_sla_breaches: u64,
}

impl DigestCounts {
    pub fn render(&self, now: Timestamp) -> String {
        let date = now.with_timezone(&manila()).format("%b %-d, %Y");
        format!(
            "Daily digest for {date}\n\
             New leads: {}\n\
             Messages received: {}\n\
             Messages sent: {}\n\
             Open SLA breaches: {}",
            self.new_leads, self.inbound_messages, self.outbound_messages, self.open_sla_breaches,
        )
    }
}

pub async fn collect(ctx: &JobContext, now: Timestamp) -> Result<DigestCounts, JobError> {
    let store = ctx.store.as_ref();
    let since = now - Duration::hours(24);
    Ok(DigestCounts {
        new_leads: LeadRepo::count_since(store, since).await?,
        inbound_messages: MessageRepo::count_since(store, Direction::Inbound, since).await?,
        outbound_messages: MessageRepo::count_since(store, Direction::Outbound, since).await?,
        open_sla_breaches: ConversationRepo::count_open_breaches(store).await?,
    })
}

#[async_trait]
impl Job for DailyDigest {
    fn name(&self) -> &'static str {
        "daily_digest"
    }

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError> {
        if ctx.config.admin_psids.is_empty() {
            tracing::warn!("Daily digest skipped: ADMIN_PSIDS is empty");
            return Ok(JobReport::default());
        }
        let counts = collect(ctx, now).await?;
        let delivered = ctx.notify_admins(&counts.render(now)).await;
        Ok(JobReport {
            processed: delivered,
            failed: ctx.config.admin_psids.len() - delivered,
        })
    }
}
