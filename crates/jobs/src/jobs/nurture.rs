//! Nurture-sequence advancement.
//!
//! Each due enrollment receives the message of its current step. It then
//! moves to the next step, due after that step's delay, or completes when
//! no steps remain. Enrollments whose sequence is missing or inactive are
//! cancelled.

use async_trait::async_trait;
use chrono::Duration;
use pagepilot_core::types::Timestamp;
use pagepilot_db::models::nurture::NurtureEnrollment;
use pagepilot_db::repositories::NurtureRepo;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};

/// Enrollments handled per pass.
const BATCH_SIZE: u32 = 100;

pub struct NurtureAdvance;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Sent,
    Completed,
    Cancelled,
}

/// `now` plus a step delay, or `None` when the delay is not representable.
fn due_after(now: Timestamp, delay_hours: f64) -> Option<Timestamp> {
    let millis = delay_hours.max(0.0) * 3_600_000.0;
    if !millis.is_finite() || millis >= i64::MAX as f64 {
        return None;
    }
    now.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

async fn advance_one(
    ctx: &JobContext,
    enrollment: &NurtureEnrollment,
    now: Timestamp,
) -> Result<Outcome, JobError> {
    let store = ctx.store.as_ref();
    let sequence = match &enrollment.sequence {
        Some(pointer) => NurtureRepo::find_sequence(store, &pointer.object_id).await?,
        None => None,
    };
    let Some(sequence) = sequence.filter(|s| s.is_active) else {
        NurtureRepo::cancel(store, &enrollment.object_id).await?;
        return Ok(Outcome::Cancelled);
    };

    let current = enrollment.current_step;
    let Some(step) = sequence.steps.get(current) else {
        NurtureRepo::complete(store, &enrollment.object_id, current, now).await?;
        return Ok(Outcome::Completed);
    };

    // The next delay is checked before anything is sent.
    let next = current + 1;
    let next_due = match sequence.steps.get(next) {
        Some(next_step) => match due_after(now, next_step.delay_hours) {
            Some(at) => Some(at),
            None => {
                NurtureRepo::cancel(store, &enrollment.object_id).await?;
                return Err(JobError::InvalidSequence(format!(
                    "step {next} of sequence {} has unusable delayHours {}",
                    sequence.object_id, next_step.delay_hours
                )));
            }
        },
        None => None,
    };

    ctx.sender.send_text(&enrollment.psid, &step.message).await?;

    match next_due {
        Some(at) => {
            NurtureRepo::advance(store, &enrollment.object_id, next, at).await?;
            Ok(Outcome::Sent)
        }
        None => {
            NurtureRepo::complete(store, &enrollment.object_id, next, now).await?;
            Ok(Outcome::Completed)
        }
    }
}

#[async_trait]
impl Job for NurtureAdvance {
    fn name(&self) -> &'static str {
        "nurture"
    }

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError> {
        let due = NurtureRepo::due_enrollments(ctx.store.as_ref(), now, BATCH_SIZE).await?;
        let mut report = JobReport::default();

        for enrollment in &due {
            match advance_one(ctx, enrollment, now).await {
                Ok(outcome) => {
                    tracing::debug!(enrollment_id = %enrollment.object_id, ?outcome, "Nurture step handled");
                    report.processed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        enrollment_id = %enrollment.object_id,
                        "Nurture step failed",
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
