//! HTTP surface for quizlink.
//!
//! Redirect endpoints for embed sites: short links, assessment deep links,
//! and a JSON view of short-link resolution.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

pub mod api_error;
mod handlers;
mod response_types;

#[cfg(test)]
mod router_tests;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use quizlink_service::ShortLinkResolver;
use tower_http::cors::CorsLayer;

pub use response_types::{LandingResponse, ResolveResponse, VersionResponse};

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Resolver over the lookup client built once at startup.
    pub resolver: ShortLinkResolver,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/s/{code}", get(handlers::links::follow_short_link))
        .route("/api/resolve/{code}", get(handlers::links::resolve_short_link))
        .route("/assessment/{quiz}", get(handlers::assessment::entry))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
