//! The job implementations.

pub mod digest;
pub mod nurture;
pub mod reengagement;
pub mod scheduled_actions;
pub mod sla;

pub use digest::DailyDigest;
pub use nurture::NurtureAdvance;
pub use reengagement::Reengagement;
pub use scheduled_actions::ScheduledActions;
pub use sla::SlaCheck;
