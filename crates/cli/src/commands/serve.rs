use std::sync::Arc;

use anyhow::Result;
use quizlink_core::AppConfig;
use quizlink_http::{AppState, create_router};
use quizlink_service::ShortLinkResolver;

use crate::build_lookup;

pub(crate) async fn run(config: &AppConfig, port: u16, host: String) -> Result<()> {
    let resolver = ShortLinkResolver::new(build_lookup(config)?);
    let router = create_router(Arc::new(AppState { resolver }));

    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
