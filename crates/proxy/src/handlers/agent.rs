//! Handlers for the AI Workshop endpoints under `/agent`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pagepilot_core::error::CoreError;
use pagepilot_core::registry::Registry;
use serde::{Deserialize, Serialize};

use crate::agent::pipeline::{ApplyReport, ApplyRequest, StepLog};
use crate::agent::plan::{GeneratePlan, SchemaSpec, GENERATE_SYSTEM_PROMPT};
use crate::agent::schema;
use crate::error::{AppError, AppResult};
use crate::llm::ChatMessage;
use crate::middleware::auth::ApiKey;
use crate::state::ProxyState;

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub registry: Registry,
    pub pages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub log: Vec<StepLog>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub success: bool,
    pub class_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub deploying: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_apply: Option<ApplyReport>,
}

/// GET /agent/source -- current registry and page files.
pub async fn source(
    _key: ApiKey,
    State(state): State<ProxyState>,
) -> AppResult<Json<SourceResponse>> {
    let dashboard = &state.pipeline.dashboard;
    Ok(Json(SourceResponse {
        registry: dashboard.load_registry().await?,
        pages: dashboard.list_pages().await?,
    }))
}

/// POST /agent/generate -- ask the model for a page plan.
pub async fn generate(
    _key: ApiKey,
    State(state): State<ProxyState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GeneratePlan>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".into()));
    }

    let dashboard = &state.pipeline.dashboard;
    let registry = dashboard.load_registry().await?;
    let pages = dashboard.list_pages().await?;
    let message = format!(
        "{prompt}\n\nCurrent registry:\n{}\n\nExisting pages:\n{}",
        registry.to_json_pretty(),
        pages.join("\n"),
    );

    let reply = state
        .model
        .complete(Some(GENERATE_SYSTEM_PROMPT), &[ChatMessage::user(message)])
        .await?;
    let plan = GeneratePlan::parse(&reply)?;
    tracing::info!(
        files = plan.files.len(),
        route = plan.route.is_some(),
        schema = plan.schema.is_some(),
        "Page plan generated",
    );
    Ok(Json(plan))
}

/// POST /agent/apply -- run the pipeline; `409` while another apply runs.
///
/// The pipeline runs on its own task so a dropped connection does not
/// abandon a build half way. The lock is held until that task ends.
pub async fn apply(
    _key: ApiKey,
    State(state): State<ProxyState>,
    Json(request): Json<ApplyRequest>,
) -> AppResult<Json<ApplyResponse>> {
    let Some(guard) = state.deploy_lock.try_acquire() else {
        tracing::warn!("Apply rejected: deploy already in progress");
        return Err(AppError::Core(CoreError::Conflict(
            "A deploy is already in progress".into(),
        )));
    };

    let pipeline = Arc::clone(&state.pipeline);
    let last_apply = Arc::clone(&state.last_apply);
    let handle = tokio::spawn(async move {
        let report = pipeline.run(request).await;
        *last_apply.write().await = Some(report.clone());
        drop(guard);
        report
    });

    let report = handle
        .await
        .map_err(|e| AppError::Core(CoreError::Internal(format!("Apply task failed: {e}"))))?;
    Ok(Json(ApplyResponse {
        success: report.success,
        log: report.log,
    }))
}

/// POST /agent/schema -- create a datastore class.
pub async fn create_schema(
    _key: ApiKey,
    State(state): State<ProxyState>,
    Json(spec): Json<SchemaSpec>,
) -> AppResult<(StatusCode, Json<SchemaResponse>)> {
    schema::create_class(state.store.as_ref(), &spec).await?;
    Ok((
        StatusCode::CREATED,
        Json(SchemaResponse {
            success: true,
            class_name: spec.class_name,
        }),
    ))
}

/// GET /agent/status
pub async fn status(_key: ApiKey, State(state): State<ProxyState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        deploying: state.deploy_lock.is_held(),
        last_apply: state.last_apply.read().await.clone(),
    })
}
