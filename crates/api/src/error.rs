use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagepilot_core::error::CoreError;
use pagepilot_db::DbError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `pagepilot_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A datastore error.
    #[error("Datastore error: {0}")]
    Datastore(#[from] DbError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Verification token mismatch.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
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

/// Classify a datastore error into an HTTP status, error code, and message.
///
/// - Wrapped domain errors keep their own classification.
/// - Object-not-found maps to 404.
/// - Other 4xx from the backend (bad field types, bad queries) map to 400
///   with the backend's message.
/// - Everything else maps to 502 with a sanitized message.
fn classify_db(err: &DbError) -> (StatusCode, &'static str, String) {
    match err {
        DbError::Core(core) => classify_core(core),
        e if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        DbError::Api {
            status, message, ..
        } if (400..500).contains(status) => {
            (StatusCode::BAD_REQUEST, "DATASTORE_REJECTED", message.clone())
        }
        DbError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        other => {
            tracing::error!(error = %other, "Datastore error");
            (
                StatusCode::BAD_GATEWAY,
                "DATASTORE_ERROR",
                "The datastore request failed".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Datastore(err) => classify_db(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datastore_not_found_is_404() {
        let err = AppError::Datastore(DbError::Api {
            status: 404,
            code: Some(101),
            message: "Object not found.".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn datastore_validation_is_400() {
        let err = AppError::Datastore(DbError::Core(CoreError::Validation("bad stage".into())));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn datastore_outage_is_502() {
        let err = AppError::Datastore(DbError::Api {
            status: 503,
            code: None,
            message: "down".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
