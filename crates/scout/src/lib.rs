//! Google Maps lead scouting for PagePilot.
//!
//! Runs a batch of Places text searches, drops chains and listings that do
//! not qualify, and saves the rest as `FbLead` rows with source `maps`.

pub mod config;
pub mod error;
pub mod places;
pub mod run;

pub use config::{PlacesConfig, ScoutConfig, Search};
pub use error::ScoutError;
pub use places::{PlaceSearch, PlacesClient};
pub use run::{scout, ScoutReport};
