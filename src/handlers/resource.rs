//! Resource handlers: thin axum adapters over `ResourceService`.

use crate::error::AppError;
use crate::extractors::AuthToken;
use crate::query::QueryOptions;
use crate::response;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use std::collections::HashMap;

type Params = Query<HashMap<String, String>>;

fn include_param(params: &HashMap<String, String>) -> Option<&str> {
    params.get("include").map(String::as_str)
}

/// Options an upstream layer placed in request extensions.
fn caller_options(ext: Option<Extension<QueryOptions>>) -> QueryOptions {
    ext.map(|Extension(o)| o).unwrap_or_default()
}

fn log_token(token: &AuthToken, resource: &str) {
    tracing::debug!(resource = %resource, token_present = token.is_present(), "write request");
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Params,
    caller: Option<Extension<QueryOptions>>,
) -> Result<impl IntoResponse, AppError> {
    let body = state
        .service
        .list(&resource, include_param(&params), caller_options(caller))
        .await?;
    Ok(response::ok(body))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    token: AuthToken,
    bytes: Bytes,
) -> Result<impl IntoResponse, AppError> {
    log_token(&token, &resource);
    let body = state.service.create(&resource, &bytes).await?;
    Ok(response::created(body))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Query(params): Params,
    caller: Option<Extension<QueryOptions>>,
) -> Result<impl IntoResponse, AppError> {
    let body = state
        .service
        .read(&resource, &id, include_param(&params), caller_options(caller))
        .await?;
    Ok(response::ok(body))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Query(params): Params,
    caller: Option<Extension<QueryOptions>>,
    token: AuthToken,
    bytes: Bytes,
) -> Result<impl IntoResponse, AppError> {
    log_token(&token, &resource);
    let body = state
        .service
        .update(
            &resource,
            &id,
            include_param(&params),
            caller_options(caller),
            &bytes,
        )
        .await?;
    Ok(response::ok(body))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete(&resource, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_related(
    State(state): State<AppState>,
    Path((resource, id, collection)): Path<(String, String, String)>,
    Query(params): Params,
    caller: Option<Extension<QueryOptions>>,
) -> Result<impl IntoResponse, AppError> {
    let body = state
        .service
        .list_related(
            &resource,
            &id,
            &collection,
            include_param(&params),
            caller_options(caller),
        )
        .await?;
    Ok(response::ok(body))
}
