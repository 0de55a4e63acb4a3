//! Shared constants for quizlink.

use std::time::Duration;

use crate::QuizType;

/// Prefix applied to every storage key written by quizlink.
pub const STORAGE_NAMESPACE: &str = "quizlink";

/// Key (under [`STORAGE_NAMESPACE`]) holding the active session pointer.
pub const ACTIVE_SESSION_KEY: &str = "activeSession";

/// Per-session key holding the answer map.
pub const ANSWERS_KEY: &str = "answers";

/// Per-session key holding the current step index.
pub const CURRENT_STEP_KEY: &str = "currentStep";

/// Namespace segment standing in for an absent doctor or key. Real ids are
/// escaped so that none of them renders to this.
pub const ABSENT_SEGMENT: &str = "-";

/// Quiz type assumed for short-link mappings that predate multi-quiz support,
/// and for sessions started without any routing signal.
pub const BASELINE_QUIZ_TYPE: QuizType = QuizType::Nose;

/// Upper bound on a single short-link lookup round trip.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between change-feed polls of a durable origin.
pub const DEFAULT_CHANGE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Path of the generic not-found destination.
pub const NOT_FOUND_PATH: &str = "/404";

/// Maximum accepted short code length; longer codes are not-found without a lookup.
pub const MAX_SHORT_CODE_LEN: usize = 64;
