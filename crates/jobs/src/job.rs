use async_trait::async_trait;
use pagepilot_core::types::Timestamp;

use crate::context::JobContext;
use crate::error::JobError;

/// Outcome counts of one job pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Items handled successfully.
    pub processed: usize,
    /// Items that failed and were logged.
    pub failed: usize,
}

/// One periodic job. A pass handles whatever is due at `now`.
///
/// Per-item failures are logged and counted in the report; an `Err` means
/// the pass as a whole could not run (for example the due-items query
/// failed).
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &JobContext, now: Timestamp) -> Result<JobReport, JobError>;
}
