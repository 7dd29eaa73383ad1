use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Mount the Facebook webhook at the fixed root-level path `/webhook`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/webhook",
        get(handlers::webhook::verify).post(handlers::webhook::receive),
    )
}
