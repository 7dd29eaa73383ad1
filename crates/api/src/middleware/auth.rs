//! API-key extractor for dashboard routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pagepilot_core::error::CoreError;
use pagepilot_core::security::{key_matches, API_KEY_HEADER};

use crate::error::AppError;
use crate::state::AppState;

/// Marker extractor: the caller presented the dashboard API key in
/// `X-API-Key`. The peer address is not consulted, so requests relayed
/// through a local reverse proxy still need the key.
///
/// ```ignore
/// async fn my_handler(_key: ApiKey) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if key_matches(provided, &state.config.dashboard_api_key) {
            Ok(ApiKey)
        } else {
            Err(AppError::Core(CoreError::Unauthorized(
                "Missing or invalid X-API-Key".into(),
            )))
        }
    }
}
