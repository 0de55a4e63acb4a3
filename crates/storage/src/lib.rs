//! Storage layer for quizlink
//!
//! Typed, namespaced key/value state over durable per-origin storage, with
//! change notifications between the execution contexts sharing an origin.

mod backend;
mod error;
mod keyed;
mod memory;
#[cfg(feature = "sqlite")]
mod migrations;
mod origin;
mod session;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{ChangeRecord, ContextId, DurableBackend, StorageEvent};
pub use error::StorageError;
pub use keyed::KeyedState;
pub use memory::MemoryBackend;
pub use origin::{Origin, StorageContext};
pub use session::{Answers, SessionAccessor};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
