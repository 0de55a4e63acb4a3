//! Namespaced storage keys.

use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::constants::{ABSENT_SEGMENT, STORAGE_NAMESPACE};
use crate::QuizType;

/// A key prefix under [`STORAGE_NAMESPACE`]. Segments are `:`-joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// The root namespace shared by all sessions of the origin.
    #[must_use]
    pub fn root() -> Self {
        Self(STORAGE_NAMESPACE.to_owned())
    }

    /// Namespace for one quiz run, derived from quiz, doctor and key.
    /// Ids are escaped so a `:` inside one cannot forge another namespace.
    #[must_use]
    pub fn for_session(quiz_type: QuizType, doctor_id: Option<&str>, key: Option<&str>) -> Self {
        Self(format!(
            "{STORAGE_NAMESPACE}:{}:{}:{}",
            quiz_type.slug(),
            id_segment(doctor_id),
            id_segment(key)
        ))
    }

    #[must_use]
    pub fn key(&self, name: &str) -> SessionKey {
        SessionKey(format!("{}:{name}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a raw storage key lives under this namespace.
    #[must_use]
    pub fn contains(&self, raw_key: &str) -> bool {
        raw_key.strip_prefix(self.0.as_str()).is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn id_segment(id: Option<&str>) -> String {
    id.filter(|id| !id.is_empty()).map_or_else(
        || ABSENT_SEGMENT.to_owned(),
        |id| utf8_percent_encode(id, NON_ALPHANUMERIC).to_string(),
    )
}

/// Fully qualified storage key. Only constructible through a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_prefixed() {
        assert_eq!(Namespace::root().key("activeSession").as_str(), "quizlink:activeSession");
        let ns = Namespace::for_session(QuizType::Dhi, Some("D1"), Some("K1"));
        assert_eq!(ns.key("answers").as_str(), "quizlink:dhi:D1:K1:answers");
    }

    #[test]
    fn test_missing_or_empty_ids_use_placeholder() {
        assert_eq!(Namespace::for_session(QuizType::Nose, None, None).as_str(), "quizlink:nose:-:-");
        assert_eq!(
            Namespace::for_session(QuizType::Nose, Some(""), Some("")).as_str(),
            "quizlink:nose:-:-"
        );
    }

    #[test]
    fn test_real_ids_never_collide_with_placeholder() {
        let absent = Namespace::for_session(QuizType::Nose, None, None);
        assert_ne!(Namespace::for_session(QuizType::Nose, Some("none"), None), absent);
        assert_ne!(Namespace::for_session(QuizType::Nose, Some("-"), None), absent);
        assert_eq!(
            Namespace::for_session(QuizType::Nose, Some("-"), None).as_str(),
            "quizlink:nose:%2D:-"
        );
    }

    #[test]
    fn test_key_separates_sessions_of_one_doctor() {
        let k1 = Namespace::for_session(QuizType::Dhi, Some("D1"), Some("K1"));
        let k2 = Namespace::for_session(QuizType::Dhi, Some("D1"), Some("K2"));
        let none = Namespace::for_session(QuizType::Dhi, Some("D1"), None);
        assert_ne!(k1, k2);
        assert!(!none.contains(k1.key("answers").as_str()));
    }

    #[test]
    fn test_separator_is_escaped() {
        let ns = Namespace::for_session(QuizType::Nose, Some("a:b"), Some("k:1"));
        assert_eq!(ns.as_str(), "quizlink:nose:a%3Ab:k%3A1");
    }

    #[test]
    fn test_contains_respects_segment_boundary() {
        let ns = Namespace::for_session(QuizType::Nose, Some("d1"), None);
        assert!(ns.contains("quizlink:nose:d1:-:answers"));
        assert!(!ns.contains("quizlink:nose:d10:-:answers"));
        assert!(!ns.contains("other:nose:d1:-:answers"));
    }
}
