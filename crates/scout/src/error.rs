use pagepilot_db::DbError;

/// Errors from the scouting run.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Places returned a non-2xx status code.
    #[error("Places API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Places API is not configured: GOOGLE_PLACES_API_KEY is unset")]
    NotConfigured,

    #[error("Invalid scout config {path}: {message}")]
    Config { path: String, message: String },

    #[error("Datastore error: {0}")]
    Datastore(#[from] DbError),
}
