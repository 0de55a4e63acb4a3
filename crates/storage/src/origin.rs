//! Origins and their execution contexts.
//!
//! An [`Origin`] owns one durable backend and a broadcast channel. Every
//! context opened from it writes through the backend and publishes a
//! [`StorageEvent`] tagged with its id; subscribers skip their own events.
//! Writes made by other processes sharing a durable backend reach this
//! process through [`Origin::spawn_change_feed`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::backend::{ContextId, DurableBackend, StorageEvent};
use crate::error::StorageError;
use crate::keyed::KeyedState;
use crate::memory::MemoryBackend;
use quizlink_core::{Namespace, SessionKey};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct OriginInner {
    backend: Arc<dyn DurableBackend>,
    events: broadcast::Sender<StorageEvent>,
    local_contexts: Mutex<HashSet<ContextId>>,
}

/// Shared storage of one origin.
#[derive(Clone)]
pub struct Origin {
    inner: Arc<OriginInner>,
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("subscribers", &self.inner.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Origin {
    #[must_use]
    pub fn new(backend: Arc<dyn DurableBackend>) -> Self {
        let (events, _initial_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(OriginInner {
                backend,
                events,
                local_contexts: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Origin over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open the durable origin at `db_path`, falling back to memory when the
    /// database cannot be opened. State then lives only for this process.
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn open_or_memory(db_path: &std::path::Path) -> Self {
        match crate::sqlite::SqliteBackend::open(db_path) {
            Ok(backend) => Self::new(Arc::new(backend)),
            Err(e) => {
                tracing::warn!(path = %db_path.display(), error = %e, "Durable storage unavailable, using memory");
                Self::in_memory()
            },
        }
    }

    /// Open a new execution context on this origin.
    #[must_use]
    pub fn open_context(&self) -> StorageContext {
        let id = ContextId::new();
        match self.inner.local_contexts.lock() {
            Ok(mut local) => {
                local.insert(id);
            },
            Err(e) => tracing::warn!(error = %e, "Context registry poisoned"),
        }
        StorageContext {
            id,
            origin: Arc::clone(&self.inner),
            _registration: Arc::new(Registration { id, origin: Arc::clone(&self.inner) }),
        }
    }

    /// Subscribe to every notification of this origin, regardless of writer.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    /// Poll the backend's change log and republish writes made by contexts
    /// outside this process. Returns immediately for backends without a log.
    ///
    /// Polling starts at the log's current end; history is not replayed.
    pub fn spawn_change_feed(&self, interval: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut cursor = match inner.backend.latest_change() {
                Ok(seq) => seq,
                Err(e) => {
                    tracing::warn!(error = %e, "Change feed disabled: cannot read change log");
                    return;
                },
            };
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match inner.backend.changes_since(cursor) {
                    Ok(records) => {
                        for record in records {
                            cursor = cursor.max(record.seq);
                            if inner.is_local(&record.event.origin) {
                                continue;
                            }
                            tracing::debug!(key = %record.event.key, seq = record.seq, "Replaying external change");
                            let _ = inner.events.send(record.event);
                        }
                    },
                    Err(e) => tracing::warn!(error = %e, "Change feed poll failed"),
                }
            }
        })
    }
}

impl OriginInner {
    fn is_local(&self, id: &ContextId) -> bool {
        self.local_contexts.lock().map(|local| local.contains(id)).unwrap_or(false)
    }
}

/// One execution context of an origin.
///
/// Raw operations report backend failures; the typed [`StorageContext::get`]
/// and [`KeyedState`] never do.
#[derive(Clone)]
pub struct StorageContext {
    id: ContextId,
    origin: Arc<OriginInner>,
    _registration: Arc<Registration>,
}

/// Keeps a context id registered as local until the last clone of the context drops.
struct Registration {
    id: ContextId,
    origin: Arc<OriginInner>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Ok(mut local) = self.origin.local_contexts.lock() {
            local.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext").field("id", &self.id).finish_non_exhaustive()
    }
}

impl StorageContext {
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Read the raw stored text of `key`.
    ///
    /// # Errors
    /// Returns the backend error when storage cannot be read.
    pub fn read_raw(&self, key: &SessionKey) -> Result<Option<String>, StorageError> {
        self.origin.backend.read(key.as_str())
    }

    /// Store raw text and notify the other contexts.
    ///
    /// # Errors
    /// Returns the backend error; no notification is sent in that case.
    pub fn write_raw(&self, key: &SessionKey, value: &str) -> Result<(), StorageError> {
        self.origin.backend.write(key.as_str(), value, &self.id)?;
        self.publish(key, Some(value.to_owned()));
        Ok(())
    }

    /// Remove `key` and notify the other contexts if it existed.
    ///
    /// # Errors
    /// Returns the backend error when storage cannot be written.
    pub fn remove_raw(&self, key: &SessionKey) -> Result<bool, StorageError> {
        let existed = self.origin.backend.remove(key.as_str(), &self.id)?;
        if existed {
            self.publish(key, None);
        }
        Ok(existed)
    }

    /// Raw keys stored under `namespace`.
    ///
    /// # Errors
    /// Returns the backend error when storage cannot be read.
    pub fn keys_in(&self, namespace: &Namespace) -> Result<Vec<String>, StorageError> {
        self.origin.backend.keys_with_prefix(&format!("{}:", namespace.as_str()))
    }

    /// Typed read. Missing, corrupt and unreadable entries all yield `default`.
    pub fn get<T: DeserializeOwned>(&self, key: &SessionKey, default: T) -> T {
        match self.read_raw(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Corrupt stored value, using default");
                    default
                },
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Storage read failed, using default");
                default
            },
        }
    }

    /// Typed write. Failures are logged, never returned.
    /// Returns whether the value reached durable storage.
    pub fn set<T: Serialize>(&self, key: &SessionKey, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Value not serializable, not persisted");
                return false;
            },
        };
        match self.write_raw(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Storage write failed, keeping value in memory only");
                false
            },
        }
    }

    /// Remove `key`, logging failures.
    pub fn clear(&self, key: &SessionKey) -> bool {
        match self.remove_raw(key) {
            Ok(existed) => existed,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Storage remove failed");
                false
            },
        }
    }

    /// Remove every key under `namespace`. Returns the number removed.
    pub fn clear_namespace(&self, namespace: &Namespace) -> usize {
        let keys = match self.keys_in(namespace) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(namespace = %namespace, error = %e, "Cannot list namespace keys");
                return 0;
            },
        };
        let mut removed = 0;
        for raw in keys {
            match self.origin.backend.remove(&raw, &self.id) {
                Ok(true) => {
                    removed += 1;
                    let _ = self.origin.events.send(StorageEvent {
                        key: raw,
                        new_value: None,
                        origin: self.id,
                    });
                },
                Ok(false) => {},
                Err(e) => tracing::warn!(key = %raw, error = %e, "Storage remove failed"),
            }
        }
        removed
    }

    /// Subscribe to notifications from all contexts of the origin.
    /// Callers filter out their own writes by [`StorageEvent::origin`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.origin.events.subscribe()
    }

    /// Typed, mirrored state bound to `key` in this context.
    #[must_use]
    pub fn keyed<T>(&self, key: SessionKey, default: T) -> KeyedState<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        KeyedState::open(self.clone(), key, default)
    }

    fn publish(&self, key: &SessionKey, new_value: Option<String>) {
        // No receivers is fine: no other context is listening.
        let _ = self.origin.events.send(StorageEvent {
            key: key.as_str().to_owned(),
            new_value,
            origin: self.id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writer_context_id_travels_with_event() {
        let origin = Origin::in_memory();
        let a = origin.open_context();
        let b = origin.open_context();
        let mut rx = b.subscribe();

        let key = Namespace::root().key("answers");
        assert!(a.set(&key, &vec![1, 2, 3]));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.key, "quizlink:answers");
        assert_eq!(event.new_value.as_deref(), Some("[1,2,3]"));
        assert_eq!(event.origin, a.id());
        assert_ne!(event.origin, b.id());
    }

    #[test]
    fn test_get_falls_back_on_corrupt_entry() {
        let origin = Origin::in_memory();
        let ctx = origin.open_context();
        let key = Namespace::root().key("currentStep");
        ctx.write_raw(&key, "{not json").unwrap();
        assert_eq!(ctx.get(&key, 7u32), 7);
    }

    #[test]
    fn test_get_falls_back_when_storage_disabled() {
        let origin = Origin::new(Arc::new(MemoryBackend::unavailable()));
        let ctx = origin.open_context();
        let key = Namespace::root().key("currentStep");
        assert!(!ctx.set(&key, &3u32));
        assert_eq!(ctx.get(&key, 0u32), 0);
    }

    #[test]
    fn test_clear_namespace_only_touches_namespace() {
        let origin = Origin::in_memory();
        let ctx = origin.open_context();
        let ns = Namespace::for_session(quizlink_core::QuizType::Dhi, Some("d1"), None);
        let other = Namespace::for_session(quizlink_core::QuizType::Dhi, Some("d10"), None);
        ctx.set(&ns.key("answers"), &1);
        ctx.set(&ns.key("currentStep"), &2);
        ctx.set(&other.key("answers"), &3);

        assert_eq!(ctx.clear_namespace(&ns), 2);
        assert_eq!(ctx.get(&other.key("answers"), 0), 3);
        assert_eq!(ctx.get(&ns.key("answers"), 0), 0);
    }
}
