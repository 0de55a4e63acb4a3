//! In-memory backend.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::backend::{ContextId, DurableBackend};
use crate::error::StorageError;

/// Process-local backend. Also used as the fallback when durable storage
/// cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
    unavailable: bool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects every operation, like storage disabled by the user agent.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { entries: Mutex::default(), unavailable: true }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("storage is disabled".to_owned()));
        }
        Ok(())
    }
}

impl DurableBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str, _context: &ContextId) -> Result<(), StorageError> {
        self.check()?;
        self.entries.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str, _context: &ContextId) -> Result<bool, StorageError> {
        self.check()?;
        Ok(self.entries.lock()?.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check()?;
        Ok(self
            .entries
            .lock()?
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let backend = MemoryBackend::new();
        let ctx = ContextId::new();
        backend.write("a", "1", &ctx).unwrap();
        assert_eq!(backend.read("a").unwrap().as_deref(), Some("1"));
        assert!(backend.remove("a", &ctx).unwrap());
        assert!(!backend.remove("a", &ctx).unwrap());
        assert_eq!(backend.read("a").unwrap(), None);
    }

    #[test]
    fn test_keys_with_prefix() {
        let backend = MemoryBackend::new();
        let ctx = ContextId::new();
        for key in ["ns:a", "ns:b", "other:c", "ns"] {
            backend.write(key, "x", &ctx).unwrap();
        }
        assert_eq!(backend.keys_with_prefix("ns:").unwrap(), vec!["ns:a", "ns:b"]);
    }

    #[test]
    fn test_unavailable_rejects_everything() {
        let backend = MemoryBackend::unavailable();
        let ctx = ContextId::new();
        assert!(matches!(backend.read("a"), Err(StorageError::Unavailable(_))));
        assert!(backend.write("a", "1", &ctx).is_err());
        assert!(backend.remove("a", &ctx).is_err());
    }
}
