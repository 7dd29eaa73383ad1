//! Facebook Graph API client for PagePilot.
//!
//! Covers the two calls the backend makes: sending a Messenger text to a
//! page-scoped id and fetching the field data of a lead-ad submission.
//! [`MessageSender`] is the seam the job runner sends through.

pub mod client;
pub mod config;
pub mod error;
pub mod sender;

pub use client::{GraphClient, LeadFieldData, LeadgenData};
pub use config::GraphConfig;
pub use error::GraphError;
pub use sender::{MessageSender, RecordingSender};
