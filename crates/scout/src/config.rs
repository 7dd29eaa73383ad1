//! Scout configuration: the search list comes from a JSON file, the Places
//! credentials from the environment.

use std::path::Path;

use pagepilot_core::scouting::scoring::FranchiseCriteria;
use pagepilot_core::types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::ScoutError;

/// One text search, e.g. `hardware store` near `Lipa, Batangas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub query: String,
    pub location: String,
}

impl Search {
    /// The text sent to Places.
    pub fn text_query(&self) -> String {
        format!("{} in {}", self.query.trim(), self.location.trim())
    }
}

fn default_concurrency() -> usize {
    4
}

/// Contents of the scout config file.
///
/// ```json
/// {
///   "businessId": "abc123",
///   "searches": [{"query": "hardware store", "location": "Lipa, Batangas"}],
///   "criteria": {"minReviews": 10}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutConfig {
    pub searches: Vec<Search>,
    /// Overrides merged over the default qualification rules.
    #[serde(default)]
    pub criteria: FranchiseCriteria,
    /// Tenant the saved leads belong to.
    #[serde(default)]
    pub business_id: Option<ObjectId>,
    /// Searches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl ScoutConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub async fn load(path: &Path) -> Result<Self, ScoutError> {
        let config_error = |message: String| ScoutError::Config {
            path: path.display().to_string(),
            message,
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| config_error(e.to_string()))?;
        let config = Self::from_json(&text).map_err(|e| config_error(e.to_string()))?;
        if config.searches.is_empty() {
            return Err(config_error("no searches configured".into()));
        }
        Ok(config)
    }
}

/// Places API access.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    /// API base, without trailing slash.
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl PlacesConfig {
    /// Load from environment variables.
    ///
    /// | Env var                 | Default                               |
    /// |-------------------------|---------------------------------------|
    /// | `GOOGLE_PLACES_URL`     | `https://places.googleapis.com/v1`    |
    /// | `GOOGLE_PLACES_API_KEY` | unset                                 |
    /// | `PLACES_TIMEOUT_SECS`   | `30`                                  |
    pub fn from_env() -> Self {
        let api_url = std::env::var("GOOGLE_PLACES_URL")
            .unwrap_or_else(|_| "https://places.googleapis.com/v1".into())
            .trim_end_matches('/')
            .to_string();

        let api_key = std::env::var("GOOGLE_PLACES_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let timeout_secs: u64 = std::env::var("PLACES_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PLACES_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            api_key,
            timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_overrides_keep_other_defaults() {
        let config = ScoutConfig::from_json(
            r#"{
                "searches": [{"query": "hardware store", "location": "Lipa, Batangas"}],
                "criteria": {"minReviews": 10}
            }"#,
        )
        .unwrap();

        let defaults = FranchiseCriteria::default();
        assert_eq!(config.criteria.min_reviews, 10);
        assert_eq!(config.criteria.max_reviews, defaults.max_reviews);
        assert_eq!(config.criteria.exclude_chains, defaults.exclude_chains);
        assert_eq!(config.concurrency, 4);
        assert!(config.business_id.is_none());
    }

    #[test]
    fn text_query_joins_query_and_location() {
        let search = Search {
            query: " bakery ".into(),
            location: "Tanauan".into(),
        };
        assert_eq!(search.text_query(), "bakery in Tanauan");
    }

    #[tokio::test]
    async fn load_rejects_empty_search_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.json");
        std::fs::write(&path, r#"{"searches": []}"#).unwrap();

        let err = ScoutConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("no searches"));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = ScoutConfig::load(Path::new("/nonexistent/scout.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Config { .. }));
    }
}
