//! Typed views over datastore rows.
//!
//! Rows are read as JSON and decoded into these structs; writes build
//! field maps directly so that only the fields being changed are sent.

pub mod business;
pub mod contact;
pub mod conversation;
pub mod job_run;
pub mod lead;
pub mod message;
pub mod nurture;
pub mod scheduled_action;
pub mod webhook_log;

use pagepilot_core::types::Record;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// Decode one row into a model.
pub fn from_row<T: DeserializeOwned>(row: Record) -> Result<T, DbError> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Decode every row, failing on the first malformed one.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, DbError> {
    rows.into_iter().map(from_row).collect()
}
