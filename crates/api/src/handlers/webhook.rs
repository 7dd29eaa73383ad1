//! Handlers for the Facebook webhook.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use pagepilot_core::error::CoreError;
use pagepilot_core::security::{constant_time_compare, verify_signature, SIGNATURE_HEADER};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::ingest::{self, WebhookPayload};
use crate::state::AppState;

/// Body Facebook expects back for an accepted delivery.
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook -- subscription handshake.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> AppResult<String> {
    let (Some(mode), Some(token), Some(challenge)) =
        (params.mode, params.verify_token, params.challenge)
    else {
        return Err(AppError::BadRequest(
            "hub.mode, hub.verify_token and hub.challenge are required".into(),
        ));
    };

    if mode == "subscribe" && constant_time_compare(&token, &state.config.verify_token) {
        tracing::info!("Webhook subscription verified");
        Ok(challenge)
    } else {
        tracing::warn!(mode = %mode, "Webhook verification rejected");
        Err(AppError::Forbidden("Verification token mismatch".into()))
    }
}

/// POST /webhook -- event delivery.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    if let Some(secret) = &state.config.app_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(secret, &body, signature) {
            tracing::warn!("Webhook delivery with invalid signature");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid X-Hub-Signature-256".into(),
            )));
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    if payload.object != "page" {
        tracing::debug!(object = %payload.object, "Ignoring non-page webhook object");
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let entries = payload.entry.len();
    let summary = ingest::ingest(state.store.as_ref(), state.graph.as_deref(), payload).await;
    tracing::info!(
        entries,
        processed = summary.processed,
        failed = summary.failed,
        "Webhook delivery handled",
    );

    Ok((StatusCode::OK, EVENT_RECEIVED).into_response())
}
