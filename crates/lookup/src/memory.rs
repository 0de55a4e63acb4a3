//! In-memory lookup table.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use quizlink_core::ShortLinkMapping;

use crate::error::LookupError;
use crate::ShortLinkLookup;

/// Lookup backed by a local map. Used when no lookup service is configured
/// for development, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryLookup {
    mappings: RwLock<HashMap<String, ShortLinkMapping>>,
}

impl InMemoryLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mappings(mappings: impl IntoIterator<Item = ShortLinkMapping>) -> Self {
        let map = mappings.into_iter().map(|m| (m.short_id.clone(), m)).collect();
        Self { mappings: RwLock::new(map) }
    }

    /// Add or replace a mapping.
    pub fn insert(&self, mapping: ShortLinkMapping) {
        match self.mappings.write() {
            Ok(mut map) => {
                map.insert(mapping.short_id.clone(), mapping);
            },
            Err(e) => tracing::warn!(error = %e, "Lookup table lock poisoned"),
        }
    }
}

#[async_trait]
impl ShortLinkLookup for InMemoryLookup {
    async fn lookup(&self, short_id: &str) -> Result<Option<ShortLinkMapping>, LookupError> {
        let map = self
            .mappings
            .read()
            .map_err(|e| LookupError::ClientInit(format!("lookup table lock poisoned: {e}")))?;
        Ok(map.get(short_id).cloned())
    }
}

/// Lookup used when the service is not configured: every call fails, so
/// short links fail closed.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredLookup;

#[async_trait]
impl ShortLinkLookup for UnconfiguredLookup {
    async fn lookup(&self, _short_id: &str) -> Result<Option<ShortLinkMapping>, LookupError> {
        Err(LookupError::NotConfigured)
    }
}
