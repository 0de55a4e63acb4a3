use anyhow::Result;
use quizlink_core::AppConfig;
use quizlink_service::SessionAdmin;

use crate::open_origin;

fn admin(config: &AppConfig) -> Result<SessionAdmin> {
    Ok(SessionAdmin::new(open_origin(config)?.open_context()))
}

pub(crate) fn run_get(config: &AppConfig, name: &str) -> Result<()> {
    match admin(config)?.get(name)? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("null"),
    }
    Ok(())
}

pub(crate) fn run_set(config: &AppConfig, name: &str, json: &str) -> Result<()> {
    let key = admin(config)?.set(name, json)?;
    println!("{key}");
    Ok(())
}

pub(crate) fn run_clear(config: &AppConfig, name: &str) -> Result<()> {
    let existed = admin(config)?.clear(name)?;
    println!("{}", if existed { "removed" } else { "not set" });
    Ok(())
}

pub(crate) async fn run_watch(config: &AppConfig) -> Result<()> {
    let origin = open_origin(config)?;
    let mut events = origin.subscribe();
    let feed = origin.spawn_change_feed(config.change_poll_interval);
    tracing::info!(path = %config.origin_db_path().display(), "Watching for session changes");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed change notifications");
                },
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    feed.abort();
    Ok(())
}
