pub mod common;
pub mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::cors::{cors, origin_header};
use crate::error::AppError;
use crate::state::AppState;
use axum::{http::Uri, middleware::from_fn, Router};

/// Paths no route matches, including extra segments past `/:resource/:id/:collection`.
async fn unmatched(uri: Uri) -> AppError {
    AppError::UnknownResource(uri.path().trim_start_matches('/').to_string())
}

/// Common routes at the root plus resource routes nested under the configured endpoint.
/// CORS wraps the whole router so unmatched paths and preflights get the same headers.
pub fn build_router(state: AppState) -> Router {
    let endpoint = state.options.normalized_endpoint();
    let origin = origin_header(&state.options.allow_origin);
    let resources = resource_routes(state);
    let router = common_routes();
    let router = if endpoint.is_empty() {
        router.merge(resources)
    } else {
        router.nest(&endpoint, resources)
    };
    router
        .fallback(unmatched)
        .layer(from_fn(move |req: axum::extract::Request, next: axum::middleware::Next| {
            cors(origin.clone(), req, next)
        }))
}
