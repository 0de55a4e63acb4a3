//! The navigation primitive the bootstrap drives.

use std::sync::Mutex;

use quizlink_core::NavigationTarget;

/// Replaces the visitor's location. Implementations must not block. The
/// controller holds no lock while calling it, so a router may mount the new
/// route from here.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &NavigationTarget);
}

/// Navigator that only records where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<NavigationTarget>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visited(&self) -> Vec<NavigationTarget> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.visited().iter().map(NavigationTarget::path).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &NavigationTarget) {
        match self.visited.lock() {
            Ok(mut visited) => visited.push(target.clone()),
            Err(e) => tracing::warn!(error = %e, "Navigation log poisoned"),
        }
    }
}
