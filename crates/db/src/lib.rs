//! Hosted-datastore access for PagePilot.
//!
//! The datastore is a Parse-compatible backend-as-a-service reached over
//! REST. [`Datastore`] is the seam: [`ParseClient`] talks to the real
//! backend, [`MemoryStore`] keeps everything in process for tests and local
//! development. Typed repositories and the dashboard CRUD helper are built
//! on top of the trait.

use std::sync::Arc;

pub mod config;
pub mod crud;
pub mod error;
pub mod memory;
pub mod models;
pub mod parse;
pub mod query;
pub mod repositories;
pub mod store;
pub mod values;

pub use config::ParseConfig;
pub use error::DbError;
pub use memory::MemoryStore;
pub use parse::ParseClient;
pub use query::{Constraint, Query, SortDirection};
pub use store::{Datastore, FindResult};

/// Shared handle to whichever datastore implementation is configured.
pub type DynStore = Arc<dyn Datastore>;

/// Build the datastore from the environment.
///
/// Uses [`ParseClient`] when `PARSE_APP_ID` is set, otherwise falls back to
/// an empty [`MemoryStore`] (useful for local runs without credentials).
pub fn store_from_env() -> Result<DynStore, DbError> {
    match ParseConfig::from_env() {
        Some(config) => {
            tracing::info!(server_url = %config.server_url, "Using Parse datastore");
            Ok(Arc::new(ParseClient::new(config)?))
        }
        None => {
            tracing::warn!("PARSE_APP_ID not set, using in-memory datastore");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
