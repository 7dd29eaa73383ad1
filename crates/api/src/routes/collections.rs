use axum::routing::{get, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Routes mounted at `/collections`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::collections::descriptors))
        .route(
            "/{collection}",
            get(handlers::collections::list).post(handlers::collections::create),
        )
        .route(
            "/{collection}/{id}",
            put(handlers::collections::update).delete(handlers::collections::delete),
        )
}
