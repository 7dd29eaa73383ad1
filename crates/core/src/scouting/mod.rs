//! Lead-scouting heuristics for scraped business listings.
//!
//! Static rule evaluation only: a weighted score with fixed bands and
//! thresholds, exclusion lists, a repeated-name chain detector, and a
//! city-to-region lookup table.

pub mod chains;
pub mod regions;
pub mod scoring;

use serde::{Deserialize, Serialize};

/// A business listing as returned by a maps search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default)]
    pub place_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    /// The search location that produced this listing.
    #[serde(default)]
    pub search_location: Option<String>,
}

impl Listing {
    pub fn has_website(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}
