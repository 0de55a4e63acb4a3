//! Typed error enum for the service layer.
//!
//! Unifies core, storage and lookup failures so callers can match on the
//! failure mode instead of downcasting.

use quizlink_core::CoreError;
use quizlink_lookup::LookupError;
use quizlink_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid quiz type, route or configuration.
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("lookup: {0}")]
    Lookup(#[from] LookupError),

    /// Caller provided invalid input (malformed JSON, empty name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A per-session key was addressed while no session is active.
    #[error("no active session")]
    NoActiveSession,
}

impl ServiceError {
    /// Whether the error names a quiz type that does not exist.
    #[must_use]
    pub const fn is_unknown_quiz_type(&self) -> bool {
        matches!(self, Self::Core(CoreError::UnknownQuizType(_)))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("invalid JSON: {err}"))
    }
}
