//! Short-link lookup for quizlink
//!
//! The single key→record query the routing subsystem makes against the
//! hosted database: `short_id` → `{doctor_id, quiz_type}`.

mod client;
pub mod error;
mod memory;

#[cfg(test)]
mod client_tests;

use async_trait::async_trait;
use quizlink_core::ShortLinkMapping;

pub use client::{truncate, HttpLookupClient, SHORT_LINKS_PATH};
pub use error::LookupError;
pub use memory::{InMemoryLookup, UnconfiguredLookup};

/// External short-link lookup.
///
/// `Ok(None)` means no mapping exists. Callers must not retry on error.
#[async_trait]
pub trait ShortLinkLookup: Send + Sync {
    async fn lookup(&self, short_id: &str) -> Result<Option<ShortLinkMapping>, LookupError>;
}
