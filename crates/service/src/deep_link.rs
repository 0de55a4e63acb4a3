//! Deep-link normalization for quiz entry routes.

use quizlink_core::{CanonicalQuizTarget, QueryParams, QuizType};
use serde::Serialize;

use crate::error::ServiceError;

/// What an entry route should do with its query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeepLinkDecision {
    /// Key or doctor present: replace the location with the canonical quiz URL.
    Redirect { target: CanonicalQuizTarget },
    /// No link signal: render the entry page; the start action goes to `start`.
    Stay { start: CanonicalQuizTarget },
}

impl DeepLinkDecision {
    #[must_use]
    pub const fn redirect(&self) -> Option<&CanonicalQuizTarget> {
        match self {
            Self::Redirect { target } => Some(target),
            Self::Stay { .. } => None,
        }
    }
}

/// Quiz type addressed by an entry route. An explicit `type` parameter wins
/// over the route's own quiz.
///
/// # Errors
/// Returns an unknown-quiz-type error when `type` names no quiz.
pub fn effective_quiz_type(entry: QuizType, params: &QueryParams) -> Result<QuizType, ServiceError> {
    match params.explicit_type() {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(entry),
    }
}

/// Decide whether the entry route of `entry` must redirect.
///
/// # Errors
/// Returns an unknown-quiz-type error when `type` names no quiz.
pub fn normalize(entry: QuizType, params: &QueryParams) -> Result<DeepLinkDecision, ServiceError> {
    let quiz_type = effective_quiz_type(entry, params)?;
    if params.has_link_signal() {
        let target = CanonicalQuizTarget::direct_link(
            quiz_type,
            params.key().map(str::to_owned),
            params.doctor().map(str::to_owned),
        );
        tracing::debug!(quiz = %quiz_type, path = %target.path(), "Deep link redirect");
        return Ok(DeepLinkDecision::Redirect { target });
    }
    Ok(DeepLinkDecision::Stay { start: CanonicalQuizTarget::start(quiz_type) })
}

/// Target of the explicit "start quiz" action on the entry page.
///
/// # Errors
/// Returns an unknown-quiz-type error when `type` names no quiz.
pub fn start_target(entry: QuizType, params: &QueryParams) -> Result<CanonicalQuizTarget, ServiceError> {
    Ok(CanonicalQuizTarget::start(effective_quiz_type(entry, params)?))
}

/// Re-runs [`normalize`] only when the parameter set actually changes.
#[derive(Debug)]
pub struct DeepLinkWatcher {
    entry: QuizType,
    last: Option<QueryParams>,
}

impl DeepLinkWatcher {
    #[must_use]
    pub const fn new(entry: QuizType) -> Self {
        Self { entry, last: None }
    }

    /// Returns `None` when `params` equal the previously observed set.
    pub fn observe(&mut self, params: &QueryParams) -> Option<Result<DeepLinkDecision, ServiceError>> {
        if self.last.as_ref() == Some(params) {
            return None;
        }
        self.last = Some(params.clone());
        Some(normalize(self.entry, params))
    }
}
