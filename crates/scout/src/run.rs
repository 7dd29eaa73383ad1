//! One scouting run: search, dedupe, drop chains, score, save.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use pagepilot_core::scouting::chains::{detect_chains, is_chain};
use pagepilot_core::scouting::regions::detect_region;
use pagepilot_core::scouting::scoring::{evaluate, Verdict};
use pagepilot_core::scouting::Listing;
use pagepilot_db::models::lead::{NewLead, SOURCE_MAPS};
use pagepilot_db::repositories::lead_repo::LeadRepo;
use pagepilot_db::Datastore;
use serde::Serialize;

use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::places::PlaceSearch;

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutReport {
    pub searches: usize,
    pub failed_searches: usize,
    pub listings: usize,
    pub unique: usize,
    pub chains: usize,
    pub rejected: usize,
    pub qualified: usize,
    pub already_stored: usize,
    pub saved: usize,
}

/// Run every configured search and save the qualified listings.
///
/// A failed search is logged and skipped. Datastore errors abort the run.
pub async fn scout(
    store: &dyn Datastore,
    places: &dyn PlaceSearch,
    config: &ScoutConfig,
) -> Result<ScoutReport, ScoutError> {
    let mut report = ScoutReport {
        searches: config.searches.len(),
        ..ScoutReport::default()
    };

    let results: Vec<_> = stream::iter(&config.searches)
        .map(|search| async move { (search, places.search(search).await) })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    let mut listings = Vec::new();
    for (search, result) in results {
        match result {
            Ok(found) => listings.extend(found),
            Err(e) => {
                report.failed_searches += 1;
                tracing::warn!(
                    query = %search.query,
                    location = %search.location,
                    error = %e,
                    "Places search failed",
                );
            }
        }
    }
    report.listings = listings.len();

    let listings = dedupe(listings);
    report.unique = listings.len();

    let chains = detect_chains(&listings);
    let (chained, independent): (Vec<Listing>, Vec<Listing>) = listings
        .into_iter()
        .partition(|listing| is_chain(listing, &chains));
    report.chains = chained.len();
    if !chains.is_empty() {
        tracing::info!(names = chains.len(), listings = chained.len(), "Chains dropped");
    }

    for listing in independent {
        let (score, tier) = match evaluate(&listing, &config.criteria) {
            Verdict::Qualified { score, tier } => (score, tier),
            Verdict::Rejected(rejection) => {
                report.rejected += 1;
                tracing::debug!(name = %listing.name, ?rejection, "Listing rejected");
                continue;
            }
        };
        report.qualified += 1;

        if let Some(place_id) = &listing.place_id {
            if LeadRepo::find_by_place_id(store, place_id).await?.is_some() {
                report.already_stored += 1;
                continue;
            }
        }

        let lead = NewLead {
            business_id: config.business_id.clone(),
            full_name: Some(listing.name.clone()),
            phone: listing.phone.clone(),
            source: SOURCE_MAPS.to_string(),
            place_id: listing.place_id.clone(),
            lead_score: Some(score),
            tier: Some(tier.as_str().to_string()),
            region: listing.address.as_deref().and_then(detect_region).map(String::from),
            ..NewLead::default()
        };
        LeadRepo::create(store, &lead).await?;
        report.saved += 1;
    }

    tracing::info!(
        searches = report.searches,
        unique = report.unique,
        qualified = report.qualified,
        saved = report.saved,
        "Scouting run finished",
    );
    Ok(report)
}

/// Keep the first listing for each place id. Listings without one are kept
/// when their name and address pair is new.
fn dedupe(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| {
            let key = match &listing.place_id {
                Some(id) => id.clone(),
                None => format!(
                    "{}|{}",
                    listing.name.to_lowercase(),
                    listing.address.as_deref().unwrap_or("").to_lowercase()
                ),
            };
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use pagepilot_db::MemoryStore;

    use super::*;
    use crate::config::Search;

    /// Canned listings keyed by location; unknown locations fail.
    struct StubPlaces(HashMap<String, Vec<Listing>>);

    #[async_trait]
    impl PlaceSearch for StubPlaces {
        async fn search(&self, search: &Search) -> Result<Vec<Listing>, ScoutError> {
            self.0
                .get(&search.location)
                .cloned()
                .ok_or(ScoutError::Api {
                    status: 500,
                    message: "boom".into(),
                })
        }
    }

    fn listing(id: &str, name: &str, location: &str) -> Listing {
        Listing {
            place_id: Some(id.to_string()),
            name: name.to_string(),
            address: Some(format!("Poblacion, {location}")),
            rating: Some(4.6),
            review_count: 60,
            website: Some("https://example.ph".into()),
            phone: Some("0917 000 0000".into()),
            types: vec!["hardware_store".into()],
            search_location: Some(location.to_string()),
        }
    }

    fn config(locations: &[&str]) -> ScoutConfig {
        ScoutConfig {
            searches: locations
                .iter()
                .map(|l| Search {
                    query: "hardware".into(),
                    location: l.to_string(),
                })
                .collect(),
            criteria: Default::default(),
            business_id: Some("biz1".into()),
            concurrency: 2,
        }
    }

    #[test]
    fn dedupe_keeps_first_per_place_id() {
        let a = listing("p1", "Dela Cruz Hardware", "Lipa");
        let mut b = a.clone();
        b.search_location = Some("Tanauan".into());
        let deduped = dedupe(vec![a, b, listing("p2", "Santos Trading", "Lipa")]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].search_location.as_deref(), Some("Lipa"));
    }

    #[tokio::test]
    async fn saves_qualified_independents_and_drops_chains() {
        let places = StubPlaces(HashMap::from([
            (
                "Lipa".to_string(),
                vec![
                    listing("p1", "Dela Cruz Hardware", "Lipa"),
                    listing("p2", "BuildRite Depot - Lipa", "Lipa"),
                    // Same place returned by both searches.
                    listing("p3", "Santos Trading", "Lipa"),
                ],
            ),
            (
                "Tanauan".to_string(),
                vec![
                    listing("p4", "BuildRite Depot - Tanauan", "Tanauan"),
                    listing("p3", "Santos Trading", "Lipa"),
                ],
            ),
        ]));
        let store = MemoryStore::new();

        let report = scout(&store, &places, &config(&["Lipa", "Tanauan"]))
            .await
            .unwrap();

        assert_eq!(report.listings, 5);
        assert_eq!(report.unique, 4);
        assert_eq!(report.chains, 2);
        assert_eq!(report.saved, 2);

        let lead = LeadRepo::find_by_place_id(&store, "p1").await.unwrap().unwrap();
        assert_eq!(lead.source.as_deref(), Some(SOURCE_MAPS));
        assert_eq!(lead.pipeline_stage.as_deref(), Some("inquiry"));
        assert_eq!(lead.tier.as_deref(), Some("Premium"));
        assert!(lead.stage_changed_at.is_some());
        assert!(LeadRepo::find_by_place_id(&store, "p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_run_skips_stored_place_ids() {
        let places = StubPlaces(HashMap::from([(
            "Lipa".to_string(),
            vec![listing("p1", "Dela Cruz Hardware", "Lipa")],
        )]));
        let store = MemoryStore::new();
        let cfg = config(&["Lipa"]);

        assert_eq!(scout(&store, &places, &cfg).await.unwrap().saved, 1);
        let again = scout(&store, &places, &cfg).await.unwrap();
        assert_eq!(again.saved, 0);
        assert_eq!(again.already_stored, 1);
    }

    #[tokio::test]
    async fn failed_search_is_skipped_and_rejections_counted() {
        let mut weak = listing("p9", "Quiet Corner Store", "Lipa");
        weak.review_count = 2;
        let places = StubPlaces(HashMap::from([("Lipa".to_string(), vec![weak])]));
        let store = MemoryStore::new();

        let report = scout(&store, &places, &config(&["Lipa", "Nowhere"]))
            .await
            .unwrap();

        assert_eq!(report.failed_searches, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.saved, 0);
    }
}
