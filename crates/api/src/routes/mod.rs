pub mod collections;
pub mod health;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /collections                                     list descriptors
/// /collections/{collection}                        list rows, create
/// /collections/{collection}/{id}                   update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/collections", collections::router())
}
