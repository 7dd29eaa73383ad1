//! Domain building blocks shared by every PagePilot crate.
//!
//! Everything here is pure: no I/O, no datastore access. The datastore,
//! job, webhook and proxy crates layer their behaviour on top.

pub mod collections;
pub mod error;
pub mod masking;
pub mod pipeline;
pub mod registry;
pub mod schedule;
pub mod scouting;
pub mod security;
pub mod types;
