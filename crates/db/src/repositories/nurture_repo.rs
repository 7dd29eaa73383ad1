//! Repository for nurture sequences and enrollments.

use pagepilot_core::collections::{NURTURE_ENROLLMENT, NURTURE_SEQUENCE};
use pagepilot_core::types::{Record, Timestamp};
use serde_json::json;

use crate::error::DbError;
use crate::models::nurture::{EnrollmentStatus, NurtureEnrollment, NurtureSequence};
use crate::models::{from_row, from_rows};
use crate::query::{Query, SortDirection};
use crate::store::Datastore;
use crate::values;

pub struct NurtureRepo;

impl NurtureRepo {
    pub async fn find_sequence(
        store: &dyn Datastore,
        id: &str,
    ) -> Result<Option<NurtureSequence>, DbError> {
        store.get(NURTURE_SEQUENCE, id).await?.map(from_row).transpose()
    }

    /// Active enrollments whose next step is due, oldest first.
    pub async fn due_enrollments(
        store: &dyn Datastore,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<NurtureEnrollment>, DbError> {
        let query = Query::new()
            .eq("status", json!(EnrollmentStatus::Active.as_str()))
            .lte("nextSendAt", values::date(now))
            .order_by("nextSendAt", SortDirection::Asc)
            .limit(limit);
        from_rows(store.find(NURTURE_ENROLLMENT, &query).await?.results)
    }

    pub async fn advance(
        store: &dyn Datastore,
        id: &str,
        next_step: usize,
        next_send_at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("currentStep".into(), json!(next_step));
        patch.insert("nextSendAt".into(), values::date(next_send_at));
        store.update(NURTURE_ENROLLMENT, id, patch).await
    }

    pub async fn complete(
        store: &dyn Datastore,
        id: &str,
        steps_sent: usize,
        at: Timestamp,
    ) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("currentStep".into(), json!(steps_sent));
        patch.insert("status".into(), json!(EnrollmentStatus::Completed.as_str()));
        patch.insert("completedAt".into(), values::date(at));
        store.update(NURTURE_ENROLLMENT, id, patch).await
    }

    pub async fn cancel(store: &dyn Datastore, id: &str) -> Result<(), DbError> {
        let mut patch = Record::new();
        patch.insert("status".into(), json!(EnrollmentStatus::Cancelled.as_str()));
        store.update(NURTURE_ENROLLMENT, id, patch).await
    }
}
