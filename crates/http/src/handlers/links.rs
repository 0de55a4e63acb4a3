use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Redirect;

use crate::AppState;
use crate::api_error::ApiError;
use crate::response_types::ResolveResponse;

/// `GET /s/{code}`: resolve and redirect. Failed and empty lookups both land on `/404`.
pub async fn follow_short_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Redirect, ApiError> {
    let outcome = state.resolver.resolve(&code).await;
    match outcome.navigation() {
        Some(target) => Ok(Redirect::to(&target.path())),
        None => Err(ApiError::NotFound(format!("quiz not found for short link {code}"))),
    }
}

/// `GET /api/resolve/{code}`: the resolution outcome without redirecting.
pub async fn resolve_short_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Json<ResolveResponse> {
    let outcome = state.resolver.resolve(&code).await;
    let path = outcome.navigation().map(|target| target.path());
    Json(ResolveResponse { code, outcome, path })
}
