use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pagepilot_core::collections::{
    CONVERSATION, FB_LEAD, MESSENGER_CONTACT, NURTURE_ENROLLMENT, NURTURE_SEQUENCE,
    SCHEDULED_ACTION,
};
use pagepilot_core::schedule::DIGEST_TIME;
use pagepilot_core::types::{ObjectId, Record, Timestamp};
use pagepilot_db::query::MAX_LIMIT;
use pagepilot_db::{values, Datastore, DbError, FindResult, MemoryStore, Query};
use pagepilot_graph::RecordingSender;
use pagepilot_jobs::jobs::{DailyDigest, NurtureAdvance, Reengagement, ScheduledActions, SlaCheck};
use pagepilot_jobs::runner::{invoke, run_daily_if_due};
use pagepilot_jobs::{Job, JobContext, JobError, JobReport, JobsConfig};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<MemoryStore>,
    sender: Arc<RecordingSender>,
    ctx: Arc<JobContext>,
}

fn harness_with(sender: RecordingSender, config: JobsConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(sender);
    let ctx = Arc::new(JobContext {
        store: store.clone(),
        sender: sender.clone(),
        config,
    });
    Harness { store, sender, ctx }
}

fn harness() -> Harness {
    harness_with(
        RecordingSender::new(),
        JobsConfig {
            admin_psids: vec!["admin-1".into()],
            ..JobsConfig::default()
        },
    )
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn utc(s: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

async fn row(store: &MemoryStore, class: &str, id: &str) -> Record {
    store.get(class, id).await.unwrap().unwrap()
}

// ---------------------------------------------------------------------------
// Nurture
// ---------------------------------------------------------------------------

async fn seed_sequence(store: &MemoryStore, active: bool) -> String {
    store
        .seed(
            NURTURE_SEQUENCE,
            record(json!({
                "name": "Welcome",
                "isActive": active,
                "steps": [
                    {"delayHours": 0, "message": "Welcome!"},
                    {"delayHours": 24, "message": "Day two"},
                ],
            })),
        )
        .await
}

async fn seed_enrollment(store: &MemoryStore, sequence: &str, step: u32, due: Timestamp) -> String {
    store
        .seed(
            NURTURE_ENROLLMENT,
            record(json!({
                "sequence": values::pointer(NURTURE_SEQUENCE, sequence),
                "psid": "lead-1",
                "currentStep": step,
                "nextSendAt": values::date(due),
                "status": "active",
            })),
        )
        .await
}

#[tokio::test]
async fn test_nurture_sends_step_and_schedules_next() {
    let h = harness();
    let now = Utc::now();
    let seq = seed_sequence(&h.store, true).await;
    let id = seed_enrollment(&h.store, &seq, 0, now - Duration::minutes(1)).await;

    let report = NurtureAdvance.run(&h.ctx, now).await.unwrap();
    assert_eq!(report, JobReport { processed: 1, failed: 0 });
    assert_eq!(h.sender.sent().await, vec![("lead-1".to_string(), "Welcome!".to_string())]);

    let enrollment = row(&h.store, NURTURE_ENROLLMENT, &id).await;
    assert_eq!(enrollment["currentStep"], 1);
    let next = values::parse_date(&enrollment["nextSendAt"]).unwrap();
    assert!((next - (now + Duration::hours(24))).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_nurture_completes_after_last_step() {
    let h = harness();
    let now = Utc::now();
    let seq = seed_sequence(&h.store, true).await;
    let id = seed_enrollment(&h.store, &seq, 1, now).await;

    NurtureAdvance.run(&h.ctx, now).await.unwrap();

    let enrollment = row(&h.store, NURTURE_ENROLLMENT, &id).await;
    assert_eq!(enrollment["status"], "completed");
    assert_eq!(enrollment["currentStep"], 2);
    assert!(enrollment.contains_key("completedAt"));
    assert_eq!(h.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_nurture_skips_future_and_cancels_inactive() {
    let h = harness();
    let now = Utc::now();
    let active = seed_sequence(&h.store, true).await;
    let inactive = seed_sequence(&h.store, false).await;
    let future = seed_enrollment(&h.store, &active, 0, now + Duration::hours(1)).await;
    let orphan = seed_enrollment(&h.store, &inactive, 0, now).await;

    NurtureAdvance.run(&h.ctx, now).await.unwrap();

    assert!(h.sender.sent().await.is_empty());
    assert_eq!(row(&h.store, NURTURE_ENROLLMENT, &future).await["currentStep"], 0);
    assert_eq!(row(&h.store, NURTURE_ENROLLMENT, &orphan).await["status"], "cancelled");
}

#[tokio::test]
async fn test_nurture_send_failure_is_counted_and_state_kept() {
    let h = harness_with(RecordingSender::failing_for(["lead-1"]), JobsConfig::default());
    let now = Utc::now();
    let seq = seed_sequence(&h.store, true).await;
    let id = seed_enrollment(&h.store, &seq, 0, now).await;

    let report = NurtureAdvance.run(&h.ctx, now).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(row(&h.store, NURTURE_ENROLLMENT, &id).await["currentStep"], 0);
}

#[tokio::test]
async fn test_nurture_unusable_delay_cancels_without_blocking_batch() {
    let h = harness();
    let now = Utc::now();
    let broken = h
        .store
        .seed(
            NURTURE_SEQUENCE,
            record(json!({
                "name": "Broken",
                "isActive": true,
                "steps": [
                    {"delayHours": 0, "message": "one"},
                    {"delayHours": 1e13, "message": "two"},
                ],
            })),
        )
        .await;
    let good = seed_sequence(&h.store, true).await;
    let enrollment = |sequence: &str, psid: &str| {
        record(json!({
            "sequence": values::pointer(NURTURE_SEQUENCE, sequence),
            "psid": psid,
            "currentStep": 0,
            "nextSendAt": values::date(now - Duration::minutes(1)),
            "status": "active",
        }))
    };
    let bad_id = h.store.seed(NURTURE_ENROLLMENT, enrollment(&broken, "bad")).await;
    let good_id = h.store.seed(NURTURE_ENROLLMENT, enrollment(&good, "good")).await;

    let report = NurtureAdvance.run(&h.ctx, now).await.unwrap();
    assert_eq!(report, JobReport { processed: 1, failed: 1 });

    // Nothing is sent for the unschedulable step, and it is not retried.
    assert_eq!(h.sender.sent().await, vec![("good".to_string(), "Welcome!".to_string())]);
    let bad = row(&h.store, NURTURE_ENROLLMENT, &bad_id).await;
    assert_eq!(bad["status"], "cancelled");
    assert_eq!(bad["currentStep"], 0);
    assert_eq!(row(&h.store, NURTURE_ENROLLMENT, &good_id).await["currentStep"], 1);

    let again = NurtureAdvance.run(&h.ctx, now).await.unwrap();
    assert_eq!(again.processed + again.failed, 0);
    assert_eq!(h.sender.sent().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Scheduled actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_scheduled_actions_execute_and_record_status() {
    let h = harness();
    let now = Utc::now();
    let lead = h
        .store
        .seed(FB_LEAD, record(json!({"pipelineStage": "inquiry"})))
        .await;

    let send = h
        .store
        .seed(
            SCHEDULED_ACTION,
            record(json!({
                "actionType": "send_message",
                "payload": {"psid": "p9", "message": "Reminder"},
                "runAt": values::date(now - Duration::minutes(5)),
                "status": "pending",
            })),
        )
        .await;
    let stage = h
        .store
        .seed(
            SCHEDULED_ACTION,
            record(json!({
                "actionType": "update_lead_stage",
                "payload": {"leadId": lead, "stage": "application"},
                "runAt": values::date(now),
                "status": "pending",
            })),
        )
        .await;
    let bogus = h
        .store
        .seed(
            SCHEDULED_ACTION,
            record(json!({
                "actionType": "launch_rocket",
                "payload": {},
                "runAt": values::date(now),
                "status": "pending",
            })),
        )
        .await;
    let later = h
        .store
        .seed(
            SCHEDULED_ACTION,
            record(json!({
                "actionType": "send_message",
                "payload": {"psid": "p9", "message": "Later"},
                "runAt": values::date(now + Duration::hours(1)),
                "status": "pending",
            })),
        )
        .await;

    let report = ScheduledActions.run(&h.ctx, now).await.unwrap();
    assert_eq!(report, JobReport { processed: 2, failed: 1 });

    assert_eq!(row(&h.store, SCHEDULED_ACTION, &send).await["status"], "done");
    assert_eq!(row(&h.store, SCHEDULED_ACTION, &stage).await["status"], "done");
    let failed = row(&h.store, SCHEDULED_ACTION, &bogus).await;
    assert_eq!(failed["status"], "failed");
    assert!(failed["error"].as_str().unwrap().contains("launch_rocket"));
    assert_eq!(row(&h.store, SCHEDULED_ACTION, &later).await["status"], "pending");

    let lead_row = row(&h.store, FB_LEAD, &lead).await;
    assert_eq!(lead_row["pipelineStage"], "application");
    assert!(lead_row.contains_key("stageChangedAt"));
    assert_eq!(h.sender.sent().await, vec![("p9".to_string(), "Reminder".to_string())]);
}

/// Delegates to a [`MemoryStore`] but rejects every update to one class.
struct RejectingUpdates {
    inner: Arc<MemoryStore>,
    class_name: &'static str,
}

#[async_trait]
impl Datastore for RejectingUpdates {
    async fn find(&self, class_name: &str, query: &Query) -> Result<FindResult, DbError> {
        self.inner.find(class_name, query).await
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<Option<Record>, DbError> {
        self.inner.get(class_name, object_id).await
    }

    async fn create(&self, class_name: &str, fields: Record) -> Result<ObjectId, DbError> {
        self.inner.create(class_name, fields).await
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: Record,
    ) -> Result<(), DbError> {
        if class_name == self.class_name {
            return Err(DbError::Api {
                status: 500,
                code: None,
                message: "write rejected".into(),
            });
        }
        self.inner.update(class_name, object_id, fields).await
    }

    async fn delete(&self, class_name: &str, object_id: &str) -> Result<bool, DbError> {
        self.inner.delete(class_name, object_id).await
    }

    async fn create_class(
        &self,
        class_name: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DbError> {
        self.inner.create_class(class_name, fields).await
    }
}

#[tokio::test]
async fn test_scheduled_actions_status_write_failure_does_not_stop_batch() {
    let h = harness();
    let now = Utc::now();
    for message in ["First", "Second"] {
        h.store
            .seed(
                SCHEDULED_ACTION,
                record(json!({
                    "actionType": "send_message",
                    "payload": {"psid": "p9", "message": message},
                    "runAt": values::date(now - Duration::minutes(1)),
                    "status": "pending",
                })),
            )
            .await;
    }
    let ctx = JobContext {
        store: Arc::new(RejectingUpdates {
            inner: h.store.clone(),
            class_name: SCHEDULED_ACTION,
        }),
        sender: h.sender.clone(),
        config: h.ctx.config.clone(),
    };

    let report = ScheduledActions.run(&ctx, now).await.unwrap();

    assert_eq!(report, JobReport { processed: 2, failed: 2 });
    let mut sent: Vec<String> = h.sender.sent().await.into_iter().map(|(_, m)| m).collect();
    sent.sort();
    assert_eq!(sent, vec!["First", "Second"]);
}

// ---------------------------------------------------------------------------
// SLA
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sla_flags_unanswered_conversations_once() {
    let h = harness();
    let now = Utc::now();
    let stale = h
        .store
        .seed(
            CONVERSATION,
            record(json!({
                "lastInboundAt": values::date(now - Duration::minutes(45)),
                "awaitingReply": true,
            })),
        )
        .await;
    let answered = h
        .store
        .seed(
            CONVERSATION,
            record(json!({
                "lastInboundAt": values::date(now - Duration::minutes(45)),
                "lastOutboundAt": values::date(now - Duration::minutes(40)),
                "awaitingReply": false,
            })),
        )
        .await;
    let fresh = h
        .store
        .seed(
            CONVERSATION,
            record(json!({
                "lastInboundAt": values::date(now - Duration::minutes(5)),
                "awaitingReply": true,
            })),
        )
        .await;

    let report = SlaCheck.run(&h.ctx, now).await.unwrap();
    assert_eq!(report.processed, 1);

    let flagged = row(&h.store, CONVERSATION, &stale).await;
    assert_eq!(flagged["slaBreached"], true);
    assert!(flagged.contains_key("slaBreachedAt"));
    assert!(!row(&h.store, CONVERSATION, &answered).await.contains_key("slaBreached"));
    assert!(!row(&h.store, CONVERSATION, &fresh).await.contains_key("slaBreached"));

    let sent = h.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "admin-1");
    assert!(sent[0].1.contains("1 conversation(s)"));

    // Already flagged: nothing new, no second alert.
    let again = SlaCheck.run(&h.ctx, now).await.unwrap();
    assert_eq!(again.processed, 0);
    assert_eq!(h.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_sla_flags_waiting_conversation_behind_many_answered_ones() {
    let h = harness();
    let now = Utc::now();
    for _ in 0..=MAX_LIMIT {
        h.store
            .seed(
                CONVERSATION,
                record(json!({
                    "lastInboundAt": values::date(now - Duration::days(2)),
                    "lastOutboundAt": values::date(now - Duration::days(2) + Duration::minutes(3)),
                    "awaitingReply": false,
                    "slaBreached": false,
                })),
            )
            .await;
    }
    let waiting = h
        .store
        .seed(
            CONVERSATION,
            record(json!({
                "lastInboundAt": values::date(now - Duration::hours(2)),
                "awaitingReply": true,
                "slaBreached": false,
            })),
        )
        .await;

    let report = SlaCheck.run(&h.ctx, now).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(row(&h.store, CONVERSATION, &waiting).await["slaBreached"], true);
}

// ---------------------------------------------------------------------------
// Digest and re-engagement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_digest_reports_counts_to_admins() {
    let h = harness();
    let now = Utc::now();
    h.store.seed(FB_LEAD, record(json!({"fullName": "Ana"}))).await;
    h.store
        .seed(
            "Message",
            record(json!({"direction": "inbound", "sentAt": values::date(now - Duration::hours(2))})),
        )
        .await;
    h.store
        .seed(
            "Message",
            record(json!({"direction": "inbound", "sentAt": values::date(now - Duration::hours(30))})),
        )
        .await;
    h.store
        .seed(CONVERSATION, record(json!({"slaBreached": true})))
        .await;

    let report = DailyDigest.run(&h.ctx, now).await.unwrap();
    assert_eq!(report.processed, 1);

    let sent = h.sender.sent().await;
    assert_eq!(sent[0].0, "admin-1");
    assert!(sent[0].1.contains("New leads: 1"));
    assert!(sent[0].1.contains("Messages received: 1"));
    assert!(sent[0].1.contains("Open SLA breaches: 1"));
}

#[tokio::test]
async fn test_digest_without_admins_is_a_noop() {
    let h = harness_with(RecordingSender::new(), JobsConfig::default());
    let report = DailyDigest.run(&h.ctx, Utc::now()).await.unwrap();
    assert_eq!(report, JobReport::default());
    assert!(h.sender.sent().await.is_empty());
}

#[tokio::test]
async fn test_reengagement_targets_idle_contacts_only() {
    let h = harness();
    let now = Utc::now();
    let idle = h
        .store
        .seed(
            MESSENGER_CONTACT,
            record(json!({
                "psid": "idle",
                "firstName": "Ana",
                "lastInteractionAt": values::date(now - Duration::days(10)),
            })),
        )
        .await;
    for (psid, extra) in [
        ("recent", json!({"lastInteractionAt": values::date(now - Duration::days(1))})),
        ("opted-out", json!({"lastInteractionAt": values::date(now - Duration::days(10)), "optedOut": true})),
        ("done", json!({"lastInteractionAt": values::date(now - Duration::days(10)), "reengagedAt": values::date(now - Duration::days(2))})),
    ] {
        let mut fields = record(extra);
        fields.insert("psid".into(), json!(psid));
        h.store.seed(MESSENGER_CONTACT, fields).await;
    }

    let report = Reengagement.run(&h.ctx, now).await.unwrap();
    assert_eq!(report.processed, 1);

    let sent = h.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "idle");
    assert!(sent[0].1.starts_with("Hi Ana!"));
    assert!(row(&h.store, MESSENGER_CONTACT, &idle).await.contains_key("reengagedAt"));
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

struct Panicking;

#[async_trait]
impl Job for Panicking {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn run(&self, _ctx: &JobContext, _now: Timestamp) -> Result<JobReport, JobError> {
        panic!("boom");
    }
}

#[tokio::test]
async fn test_invoke_survives_a_panicking_job() {
    let h = harness();
    let job: Arc<dyn Job> = Arc::new(Panicking);
    assert!(invoke(h.ctx.clone(), job, Utc::now()).await.is_none());

    // The runtime is still usable afterwards.
    let job: Arc<dyn Job> = Arc::new(SlaCheck);
    assert!(invoke(h.ctx.clone(), job, Utc::now()).await.is_some());
}

#[tokio::test]
async fn test_daily_job_runs_once_per_manila_date() {
    let h = harness();
    let job: Arc<dyn Job> = Arc::new(DailyDigest);

    // 07:59 Manila: not yet due.
    let before = utc("2026-03-09T23:59:00Z");
    assert!(!run_daily_if_due(&h.ctx, &job, DIGEST_TIME, before).await.unwrap());

    // 08:00 Manila: runs.
    let at = utc("2026-03-10T00:00:00Z");
    assert!(run_daily_if_due(&h.ctx, &job, DIGEST_TIME, at).await.unwrap());
    assert_eq!(h.sender.sent().await.len(), 1);

    // Later the same Manila day: already claimed.
    let later = utc("2026-03-10T09:00:00Z");
    assert!(!run_daily_if_due(&h.ctx, &job, DIGEST_TIME, later).await.unwrap());

    // Next Manila day after 08:00: runs again.
    let tomorrow = utc("2026-03-11T00:30:00Z");
    assert!(run_daily_if_due(&h.ctx, &job, DIGEST_TIME, tomorrow).await.unwrap());
    assert_eq!(h.sender.sent().await.len(), 2);
}

#[tokio::test]
async fn test_daily_claim_survives_restart() {
    let h = harness();
    let job: Arc<dyn Job> = Arc::new(DailyDigest);
    let at = utc("2026-03-10T01:00:00Z");
    assert!(run_daily_if_due(&h.ctx, &job, DIGEST_TIME, at).await.unwrap());

    // A fresh context over the same store sees the ledger row.
    let restarted = Arc::new(JobContext {
        store: h.store.clone(),
        sender: Arc::new(RecordingSender::new()),
        config: h.ctx.config.clone(),
    });
    assert!(!run_daily_if_due(&restarted, &job, DIGEST_TIME, at).await.unwrap());
}
