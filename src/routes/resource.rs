//! Resource routes: `/:resource`, `/:resource/:id`, `/:resource/:id/:collection`.
//! Handlers resolve the model from the path segment at request time.

use crate::handlers::resource::{create, delete, list, list_related, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub fn resource_routes(state: AppState) -> Router {
    let limit = state.options.max_body_bytes;
    Router::new()
        .route("/:resource", get(list).post(create))
        .route("/:resource/:id", get(read).put(update).delete(delete))
        .route("/:resource/:id/:collection", get(list_related))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(limit)))
        .with_state(state)
}
