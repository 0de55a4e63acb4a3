//! Durable per-origin storage abstraction.
//!
//! A backend is the raw string store shared by every context of an origin.
//! It is synchronous and fallible; callers above it decide how to recover.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

/// Identity of one execution context (tab, window or process) of an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ContextId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Change notification delivered to the other contexts of an origin.
///
/// `new_value` is the raw stored text, or `None` when the entry was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: ContextId,
}

/// One entry of a backend's change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub seq: u64,
    pub event: StorageEvent,
}

/// Raw key/value storage shared by all contexts of an origin.
pub trait DurableBackend: Send + Sync {
    /// Read the raw value stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, recording `context` as the writer.
    fn write(&self, key: &str, value: &str, context: &ContextId) -> Result<(), StorageError>;

    /// Remove `key`. Returns `true` if an entry existed.
    fn remove(&self, key: &str, context: &ContextId) -> Result<bool, StorageError>;

    /// List keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Changes recorded after `seq`, oldest first.
    ///
    /// Backends shared only inside one process have no log and return nothing;
    /// their notifications travel over the origin's in-process channel.
    fn changes_since(&self, _seq: u64) -> Result<Vec<ChangeRecord>, StorageError> {
        Ok(Vec::new())
    }

    /// Highest sequence number currently in the change log.
    fn latest_change(&self) -> Result<u64, StorageError> {
        Ok(0)
    }
}
