//! Periodic jobs for PagePilot.
//!
//! Five jobs run against the datastore: nurture advancement, scheduled
//! actions and the SLA check on fixed intervals, the admin digest and the
//! re-engagement sweep once a day at a Manila wall-clock time. The
//! [`runner`] owns the schedules; each job only knows how to do one pass.

pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod jobs;
pub mod runner;

pub use config::JobsConfig;
pub use context::JobContext;
pub use error::JobError;
pub use job::{Job, JobReport};
