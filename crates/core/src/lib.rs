//! Core types for quizlink
//!
//! Quiz identities, canonical navigation targets, route parsing and
//! process configuration shared by every other crate.

pub mod constants;
mod env_config;
mod error;
mod namespace;
mod quiz_type;
mod route;
mod session;
mod target;

pub use env_config::*;
pub use error::*;
pub use namespace::{Namespace, SessionKey};
pub use quiz_type::QuizType;
pub use route::{QueryParams, Route, RouteRequest};
pub use session::{SessionContext, ShortLinkMapping};
pub use target::{CanonicalQuizTarget, NavigationTarget, QuizMode};
