//! Inspection and editing of persisted session state by key name.
//!
//! `activeSession` addresses the root pointer; any other name addresses a
//! key inside the active session's namespace.

use quizlink_core::constants::ACTIVE_SESSION_KEY;
use quizlink_core::{Namespace, SessionContext, SessionKey};
use quizlink_storage::StorageContext;
use serde_json::Value;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct SessionAdmin {
    ctx: StorageContext,
}

impl SessionAdmin {
    #[must_use]
    pub const fn new(ctx: StorageContext) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn active_session(&self) -> Option<SessionContext> {
        self.ctx.get(&Namespace::root().key(ACTIVE_SESSION_KEY), None)
    }

    /// Resolve `name` to its storage key.
    ///
    /// # Errors
    /// Returns [`ServiceError::NoActiveSession`] for per-session names when no
    /// session is active.
    pub fn key_for(&self, name: &str) -> Result<SessionKey, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("empty key name".to_owned()));
        }
        if name == ACTIVE_SESSION_KEY {
            return Ok(Namespace::root().key(name));
        }
        let session = self.active_session().ok_or(ServiceError::NoActiveSession)?;
        Ok(session.namespace().key(name))
    }

    /// Stored value of `name`. Entries that are not valid JSON come back as a
    /// JSON string holding the raw text.
    pub fn get(&self, name: &str) -> Result<Option<Value>, ServiceError> {
        let key = self.key_for(name)?;
        let Some(raw) = self.ctx.read_raw(&key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw))))
    }

    /// Store `json` under `name` after checking it parses.
    pub fn set(&self, name: &str, json: &str) -> Result<SessionKey, ServiceError> {
        let value: Value = serde_json::from_str(json)?;
        let key = self.key_for(name)?;
        self.ctx.write_raw(&key, &value.to_string())?;
        tracing::info!(key = %key, "Session value written");
        Ok(key)
    }

    /// Remove `name`. Returns whether it existed.
    pub fn clear(&self, name: &str) -> Result<bool, ServiceError> {
        let key = self.key_for(name)?;
        Ok(self.ctx.remove_raw(&key)?)
    }
}
