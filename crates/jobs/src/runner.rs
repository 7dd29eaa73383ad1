//! Job scheduling.
//!
//! Interval jobs each get a loop driven by `tokio::time::interval_at`.
//! Daily jobs share one loop that ticks every minute and asks the
//! persisted `JobRun` ledger whether today's Manila run has happened yet,
//! so a restart neither skips nor repeats a daily run.
//!
//! Every invocation is spawned on its own task and awaited: errors and
//! panics are logged and the loop carries on. No retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pagepilot_core::schedule::{DailyAt, DIGEST_TIME, REENGAGEMENT_TIME};
use pagepilot_core::types::Timestamp;
use pagepilot_db::repositories::JobRunRepo;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Job, JobReport};
use crate::jobs::{DailyDigest, NurtureAdvance, Reengagement, ScheduledActions, SlaCheck};

/// How often daily schedules are evaluated.
pub const DAILY_TICK: Duration = Duration::from_secs(60);

/// When a job runs.
#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    /// First run `first_after` boot, then every `every`.
    Every { first_after: Duration, every: Duration },
    /// Once a day at a Manila wall-clock time.
    Daily(DailyAt),
}

pub struct ScheduledJob {
    pub job: Arc<dyn Job>,
    pub schedule: Schedule,
}

/// The production job table.
pub fn default_jobs(ctx: &JobContext) -> Vec<ScheduledJob> {
    vec![
        ScheduledJob {
            job: Arc::new(NurtureAdvance),
            schedule: Schedule::Every {
                first_after: Duration::from_secs(10),
                every: ctx.config.nurture_interval,
            },
        },
        ScheduledJob {
            job: Arc::new(ScheduledActions),
            schedule: Schedule::Every {
                first_after: Duration::from_secs(60),
                every: Duration::from_secs(60),
            },
        },
        ScheduledJob {
            job: Arc::new(SlaCheck),
            schedule: Schedule::Every {
                first_after: Duration::from_secs(20),
                every: Duration::from_secs(30 * 60),
            },
        },
        ScheduledJob {
            job: Arc::new(DailyDigest),
            schedule: Schedule::Daily(DIGEST_TIME),
        },
        ScheduledJob {
            job: Arc::new(Reengagement),
            schedule: Schedule::Daily(REENGAGEMENT_TIME),
        },
    ]
}

/// Run one pass of `job` on its own task, logging the outcome.
///
/// Returns the report when the pass completed.
pub async fn invoke(ctx: Arc<JobContext>, job: Arc<dyn Job>, now: Timestamp) -> Option<JobReport> {
    let name = job.name();
    let handle = tokio::spawn(async move { job.run(&ctx, now).await });

    match handle.await {
        Ok(Ok(report)) => {
            if report.processed > 0 || report.failed > 0 {
                tracing::info!(
                    job = name,
                    processed = report.processed,
                    failed = report.failed,
                    "Job pass finished",
                );
            } else {
                tracing::debug!(job = name, "Job pass finished: nothing due");
            }
            Some(report)
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, job = name, "Job pass failed");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, job = name, "Job task panicked or was cancelled");
            None
        }
    }
}

/// Run `job` if its daily slot at `at` is due and unclaimed.
///
/// The ledger row is claimed before the job runs, so a failed pass is not
/// retried the same day. Returns whether the job was invoked.
pub async fn run_daily_if_due(
    ctx: &Arc<JobContext>,
    job: &Arc<dyn Job>,
    at: DailyAt,
    now: Timestamp,
) -> Result<bool, JobError> {
    let store = ctx.store.as_ref();
    let last_run = JobRunRepo::last_run_date(store, job.name()).await?;
    if !at.is_due(now, last_run) {
        return Ok(false);
    }
    if !JobRunRepo::claim(store, job.name(), DailyAt::local_date(now)).await? {
        return Ok(false);
    }

    invoke(Arc::clone(ctx), Arc::clone(job), now).await;
    tracing::info!(
        job = job.name(),
        next_run = %at.next_after(now),
        "Daily job ran",
    );
    Ok(true)
}

async fn interval_loop(
    ctx: Arc<JobContext>,
    job: Arc<dyn Job>,
    first_after: Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + first_after, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job = job.name(), "Job loop stopping");
                break;
            }
            _ = interval.tick() => {
                invoke(Arc::clone(&ctx), Arc::clone(&job), Utc::now()).await;
            }
        }
    }
}

async fn daily_loop(
    ctx: Arc<JobContext>,
    jobs: Vec<(Arc<dyn Job>, DailyAt)>,
    cancel: CancellationToken,
) {
    for (job, at) in &jobs {
        let now = Utc::now();
        tracing::info!(
            job = job.name(),
            next_run = %at.next_after(now),
            delay_secs = at.delay_from(now).as_secs(),
            "Daily job scheduled",
        );
    }

    let mut interval = tokio::time::interval(DAILY_TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Daily job loop stopping");
                break;
            }
            _ = interval.tick() => {
                let now = Utc::now();
                for (job, at) in &jobs {
                    if let Err(e) = run_daily_if_due(&ctx, job, *at, now).await {
                        tracing::error!(error = %e, job = job.name(), "Daily schedule check failed");
                    }
                }
            }
        }
    }
}

/// Run every job on its schedule until `cancel` fires.
pub async fn run(ctx: Arc<JobContext>, jobs: Vec<ScheduledJob>, cancel: CancellationToken) {
    let mut tasks = JoinSet::new();
    let mut daily = Vec::new();

    for scheduled in jobs {
        match scheduled.schedule {
            Schedule::Every { first_after, every } => {
                tracing::info!(
                    job = scheduled.job.name(),
                    first_after_secs = first_after.as_secs(),
                    every_secs = every.as_secs(),
                    "Interval job scheduled",
                );
                tasks.spawn(interval_loop(
                    Arc::clone(&ctx),
                    scheduled.job,
                    first_after,
                    every,
                    cancel.clone(),
                ));
            }
            Schedule::Daily(at) => daily.push((scheduled.job, at)),
        }
    }
    if !daily.is_empty() {
        tasks.spawn(daily_loop(Arc::clone(&ctx), daily, cancel.clone()));
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Job loop exited abnormally");
        }
    }
    tracing::info!("Job runner stopped");
}
