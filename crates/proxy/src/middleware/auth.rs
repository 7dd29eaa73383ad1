//! API-key extractor for proxy routes.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use pagepilot_core::error::CoreError;
use pagepilot_core::security::{is_authorized, API_KEY_HEADER};

use crate::error::AppError;
use crate::state::ProxyState;

/// The caller presented `X-API-Key` matching `PROXY_API_KEY`, or connected
/// from a loopback address.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<ProxyState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ProxyState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if is_authorized(provided, &state.config.api_key, peer) {
            Ok(ApiKey)
        } else {
            tracing::warn!(?peer, "Rejected proxy request without valid API key");
            Err(AppError::Core(CoreError::Unauthorized(
                "Missing or invalid X-API-Key".into(),
            )))
        }
    }
}
