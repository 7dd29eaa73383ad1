//! Repository for the `JobRun` ledger used by daily jobs.

use chrono::NaiveDate;
use pagepilot_core::collections::JOB_RUN;
use pagepilot_core::types::Record;
use serde_json::json;

use crate::error::DbError;
use crate::models::from_row;
use crate::models::job_run::JobRun;
use crate::query::{Query, SortDirection};
use crate::store::Datastore;
use crate::values;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct JobRunRepo;

impl JobRunRepo {
    /// The most recent local date `job` was claimed for.
    pub async fn last_run_date(
        store: &dyn Datastore,
        job: &str,
    ) -> Result<Option<NaiveDate>, DbError> {
        let query = Query::new()
            .eq("job", json!(job))
            .order_by("runDate", SortDirection::Desc);
        let Some(row) = store.first(JOB_RUN, query).await? else {
            return Ok(None);
        };
        let run: JobRun = from_row(row)?;
        NaiveDate::parse_from_str(&run.run_date, DATE_FORMAT)
            .map(Some)
            .map_err(|e| DbError::Decode(format!("JobRun {}: bad runDate: {e}", run.object_id)))
    }

    /// Claim the run of `job` for `date`. Returns `false` when a row for
    /// that date already exists.
    ///
    /// Check-then-insert: two processes racing on the same minute can both
    /// claim. Only one job runner is deployed.
    pub async fn claim(store: &dyn Datastore, job: &str, date: NaiveDate) -> Result<bool, DbError> {
        let run_date = date.format(DATE_FORMAT).to_string();
        let existing = Query::new()
            .eq("job", json!(job))
            .eq("runDate", json!(run_date));
        if store.first(JOB_RUN, existing).await?.is_some() {
            return Ok(false);
        }

        let mut fields = Record::new();
        fields.insert("job".into(), json!(job));
        fields.insert("runDate".into(), json!(run_date));
        fields.insert("claimedAt".into(), values::now());
        store.create(JOB_RUN, fields).await?;
        Ok(true)
    }
}
