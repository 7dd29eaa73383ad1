//! Google Places Text Search client.

use std::time::Duration;

use async_trait::async_trait;
use pagepilot_core::scouting::Listing;
use serde::Deserialize;
use serde_json::json;

use crate::config::{PlacesConfig, Search};
use crate::error::ScoutError;

/// Fields requested from Places; billing depends on this list.
const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.rating,\
places.userRatingCount,places.websiteUri,places.nationalPhoneNumber,places.types,nextPageToken";

/// Places serves at most three pages per query.
const MAX_PAGES: usize = 3;

const PAGE_SIZE: u32 = 20;

/// Source of listings for a search.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, search: &Search) -> Result<Vec<Listing>, ScoutError>;
}

pub struct PlacesClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl std::fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<Place>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    id: String,
    #[serde(default)]
    display_name: Option<LocalizedText>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_rating_count: Option<u32>,
    #[serde(default)]
    website_uri: Option<String>,
    #[serde(default)]
    national_phone_number: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl Place {
    fn into_listing(self, location: &str) -> Listing {
        Listing {
            place_id: Some(self.id),
            name: self.display_name.map(|n| n.text).unwrap_or_default(),
            address: self.formatted_address,
            rating: self.rating,
            review_count: self.user_rating_count.unwrap_or(0),
            website: self.website_uri,
            phone: self.national_phone_number,
            types: self.types,
            search_location: Some(location.to_string()),
        }
    }
}

impl PlacesClient {
    /// Build a client. Fails with [`ScoutError::NotConfigured`] without an
    /// API key.
    pub fn new(config: &PlacesConfig) -> Result<Self, ScoutError> {
        let api_key = config.api_key.clone().ok_or(ScoutError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    async fn fetch_page(
        &self,
        text_query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchTextResponse, ScoutError> {
        let mut body = json!({
            "textQuery": text_query,
            "pageSize": PAGE_SIZE,
        });
        if let Some(token) = page_token {
            body["pageToken"] = json!(token);
        }

        let response = self
            .client
            .post(format!("{}/places:searchText", self.api_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(ScoutError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PlaceSearch for PlacesClient {
    async fn search(&self, search: &Search) -> Result<Vec<Listing>, ScoutError> {
        let text_query = search.text_query();
        let mut listings = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(&text_query, page_token.as_deref()).await?;
            listings.extend(
                page.places
                    .into_iter()
                    .map(|place| place.into_listing(&search.location)),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(query = %text_query, results = listings.len(), "Places search finished");
        Ok(listings)
    }
}
