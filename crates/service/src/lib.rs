//! Service layer for quizlink
//!
//! Resolution logic between the HTTP/CLI surfaces and the storage and lookup
//! crates: short links, deep links, the session bootstrap, and inspection of
//! persisted session state.

mod bootstrap;
pub mod deep_link;
mod error;
mod navigator;
mod session_admin;
mod short_link;


pub use bootstrap::{
    BootstrapController, BootstrapError, BootstrapState, MountHandle, MountToken, RouteChange,
};
pub use deep_link::{DeepLinkDecision, DeepLinkWatcher};
pub use error::ServiceError;
pub use navigator::{Navigator, RecordingNavigator};
pub use session_admin::SessionAdmin;
pub use short_link::{ShortLinkOutcome, ShortLinkResolver};
