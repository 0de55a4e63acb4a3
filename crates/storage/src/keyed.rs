//! Typed state bound to one storage key, mirrored in memory.
//!
//! The mirror is a `watch` channel: writes from this context update it
//! synchronously, notifications from other contexts update it once their
//! payload decodes. Quiz UI code reads and subscribes through it.

use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::backend::StorageEvent;
use crate::origin::StorageContext;
use quizlink_core::SessionKey;

/// Mirrored value of one namespaced key in one context.
pub struct KeyedState<T> {
    ctx: StorageContext,
    key: SessionKey,
    default: T,
    mirror: watch::Sender<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for KeyedState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedState")
            .field("key", &self.key)
            .field("value", &*self.mirror.borrow())
            .finish_non_exhaustive()
    }
}

impl<T> KeyedState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn open(ctx: StorageContext, key: SessionKey, default: T) -> Self {
        let initial = ctx.get(&key, default.clone());
        let (mirror, _initial_rx) = watch::channel(initial);
        Self { ctx, key, default, mirror }
    }

    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Current mirrored value.
    #[must_use]
    pub fn get(&self) -> T {
        self.mirror.borrow().clone()
    }

    /// Replace the value. The mirror reflects it before this returns.
    pub fn set(&self, value: T) {
        self.update(|_| value);
    }

    /// Read-modify-write against the latest mirrored value.
    ///
    /// The transform and the write run under the mirror's lock, so
    /// successive updates from this context apply in call order and none
    /// observes a stale value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.mirror.send_modify(|current| {
            let next = f(current);
            self.ctx.set(&self.key, &next);
            *current = next;
        });
    }

    /// Remove the stored entry and reset the mirror to the default.
    pub fn clear(&self) {
        self.mirror.send_modify(|current| {
            self.ctx.clear(&self.key);
            *current = self.default.clone();
        });
    }

    /// Re-read the stored value, e.g. after missed notifications.
    pub fn reload(&self) {
        let fresh = self.ctx.get(&self.key, self.default.clone());
        self.mirror.send_replace(fresh);
    }

    /// Apply a change notification. Returns whether the mirror changed.
    ///
    /// Events for other keys or from this context are ignored. A payload
    /// that does not decode leaves the mirror untouched; a removal resets it
    /// to the default.
    pub fn apply_event(&self, event: &StorageEvent) -> bool {
        if event.key != self.key.as_str() || event.origin == self.ctx.id() {
            return false;
        }
        match &event.new_value {
            Some(raw) => match serde_json::from_str::<T>(raw) {
                Ok(value) => {
                    self.mirror.send_replace(value);
                    true
                },
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Ignoring malformed change notification");
                    false
                },
            },
            None => {
                self.mirror.send_replace(self.default.clone());
                true
            },
        }
    }

    /// Receiver that fires whenever the mirrored value changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<T> {
        self.mirror.subscribe()
    }

    /// Keep this state in sync with the other contexts of its origin.
    ///
    /// The task holds only a weak reference and ends once the state is dropped
    /// and the next notification arrives, or when the origin closes.
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.ctx.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = rx.recv().await;
                let Some(state) = weak.upgrade() else { break };
                match event {
                    Ok(event) => {
                        state.apply_event(&event);
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(key = %state.key, skipped, "Missed change notifications, reloading");
                        state.reload();
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
