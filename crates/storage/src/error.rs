//! Typed error enum for the storage layer.
//!
//! These errors never reach quiz UI callers: the keyed state API logs them and
//! falls back to defaults. They surface only from backend and origin plumbing.

use thiserror::Error;

/// Storage-layer error covering every backend failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused the operation (disabled storage, quota exceeded).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// SQL / connection failure.
    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool could not hand out a connection.
    #[cfg(feature = "sqlite")]
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}
