use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CanonicalQuizTarget, Namespace, QuizMode, QuizType};

/// Short-link record as returned by the lookup service.
///
/// `quiz_type` is optional because mappings created before multi-quiz
/// support carry no type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortLinkMapping {
    pub short_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub quiz_type: Option<String>,
}

/// The persisted pointer to the session a visitor is currently taking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub quiz_type: QuizType,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub mode: QuizMode,
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    #[must_use]
    pub fn from_target(target: &CanonicalQuizTarget, started_at: DateTime<Utc>) -> Self {
        Self {
            quiz_type: target.quiz_type,
            doctor_id: target.doctor_id.clone().filter(|d| !d.is_empty()),
            key: target.key.clone().filter(|k| !k.is_empty()),
            mode: target.mode,
            started_at,
        }
    }

    /// Fresh session for a quiz with no doctor or key attached.
    #[must_use]
    pub fn fresh(quiz_type: QuizType, started_at: DateTime<Utc>) -> Self {
        Self { quiz_type, doctor_id: None, key: None, mode: QuizMode::Single, started_at }
    }

    /// Whether both contexts address the same quiz run (quiz, doctor and key).
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.quiz_type == other.quiz_type && self.doctor_id == other.doctor_id && self.key == other.key
    }

    #[must_use]
    pub fn target(&self) -> CanonicalQuizTarget {
        match (self.mode, &self.doctor_id) {
            (QuizMode::Share, Some(doctor)) => {
                CanonicalQuizTarget::share(self.quiz_type, doctor.clone())
            },
            _ if self.doctor_id.is_some() || self.key.is_some() => {
                CanonicalQuizTarget::direct_link(self.quiz_type, self.key.clone(), self.doctor_id.clone())
            },
            _ => CanonicalQuizTarget::start(self.quiz_type),
        }
    }

    /// Storage namespace of this session's answers and progress.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::for_session(self.quiz_type, self.doctor_id.as_deref(), self.key.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_without_quiz_type_deserializes() {
        let mapping: ShortLinkMapping =
            serde_json::from_str(r#"{"short_id":"abc","doctor_id":"d1"}"#).unwrap();
        assert_eq!(mapping.quiz_type, None);
    }

    #[test]
    fn test_from_target_drops_empty_link_params() {
        let target = CanonicalQuizTarget::direct_link(QuizType::Dhi, None, Some("D1".to_owned()));
        let ctx = SessionContext::from_target(&target, Utc::now());
        assert_eq!(ctx.key, None);
        assert_eq!(ctx.doctor_id.as_deref(), Some("D1"));
        assert_eq!(ctx.target().path(), "/quiz?type=DHI&key=&doctor=D1&mode=single");
    }

    #[test]
    fn test_share_context_round_trips_to_share_target() {
        let target = CanonicalQuizTarget::share(QuizType::Snot22, "d1".to_owned());
        let ctx = SessionContext::from_target(&target, Utc::now());
        assert_eq!(ctx.target(), target);
        assert_eq!(ctx.namespace().as_str(), "quizlink:snot22:d1:-");
    }

    #[test]
    fn test_same_identity_ignores_start_time_and_mode() {
        let a = SessionContext::fresh(QuizType::Nose, Utc::now());
        let mut b = SessionContext::fresh(QuizType::Nose, Utc::now());
        b.mode = QuizMode::Share;
        assert!(a.same_identity(&b));
        b.doctor_id = Some("d2".to_owned());
        assert!(!a.same_identity(&b));
    }
}
