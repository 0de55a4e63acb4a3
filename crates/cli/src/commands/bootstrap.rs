use std::sync::Arc;

use anyhow::Result;
use quizlink_core::AppConfig;
use quizlink_service::{BootstrapController, Navigator, RecordingNavigator, ShortLinkResolver};

use crate::{build_lookup, open_origin};

pub(crate) async fn run(config: &AppConfig, url: &str) -> Result<()> {
    let origin = open_origin(config)?;
    let navigator = Arc::new(RecordingNavigator::new());
    let controller = Arc::new(BootstrapController::new(
        origin.open_context(),
        ShortLinkResolver::new(build_lookup(config)?),
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    ));

    let mut mount = controller.mount_url(url);
    let state = mount.settled().await;
    let output = serde_json::json!({
        "state": state,
        "navigated": navigator.paths(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
