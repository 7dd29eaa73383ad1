//! The "AI Workshop" code-generation pipeline.
//!
//! `generate` asks the model for a [`plan::GeneratePlan`]; `apply` runs it
//! through [`pipeline::Pipeline`] under the [`lock::DeployLock`].

pub mod command;
pub mod lock;
pub mod pipeline;
pub mod plan;
pub mod schema;
pub mod workspace;
