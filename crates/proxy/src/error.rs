use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagepilot_core::error::CoreError;
use pagepilot_db::DbError;
use serde_json::json;

use crate::agent::command::CommandError;

/// Failures inside the proxy's token, model and pipeline layers.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Datastore(#[from] DbError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credentials file unusable: {0}")]
    Credentials(String),

    #[error("Token refresh rejected ({status}): {message}")]
    TokenRefresh { status: u16, message: String },

    #[error("LLM API error ({status}): {message}")]
    Llm { status: u16, message: String },

    #[error("Model output is not a usable plan: {0}")]
    InvalidPlan(String),

    #[error("Path escapes the dashboard source tree: {0}")]
    PathEscape(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("'{command}' exited with code {exit_code}:\n{output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

/// HTTP-facing error type for proxy handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

fn classify_proxy(err: &ProxyError) -> (StatusCode, &'static str, String) {
    match err {
        ProxyError::Core(core) => classify_core(core),
        ProxyError::Datastore(DbError::Core(core)) => classify_core(core),
        ProxyError::Datastore(DbError::Api { status, message, .. }) if (400..500).contains(status) => {
            (StatusCode::BAD_REQUEST, "DATASTORE_REJECTED", message.clone())
        }
        ProxyError::Datastore(DbError::InvalidQuery(msg)) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
        }
        ProxyError::InvalidPlan(msg) => (StatusCode::BAD_GATEWAY, "INVALID_PLAN", msg.clone()),
        ProxyError::PathEscape(path) => (
            StatusCode::BAD_REQUEST,
            "INVALID_PATH",
            format!("Path escapes the dashboard source tree: {path}"),
        ),
        ProxyError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", err.to_string()),
        ProxyError::Llm { .. }
        | ProxyError::TokenRefresh { .. }
        | ProxyError::Credentials(_)
        | ProxyError::Http(_)
        | ProxyError::Datastore(_) => {
            tracing::error!(error = %err, "Upstream failure");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
        }
        ProxyError::Io(_) | ProxyError::Command(_) | ProxyError::CommandFailed { .. } => {
            tracing::error!(error = %err, "Proxy internal failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Proxy(err) => classify_proxy(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
