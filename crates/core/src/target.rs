//! Canonical navigation targets produced by link resolution.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::constants::NOT_FOUND_PATH;
use crate::QuizType;

/// Characters escaped inside a single path segment (RFC 3986 unreserved set is kept).
const PATH_SEGMENT: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// How the quiz UI should present a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Stand-alone single quiz, reached from a direct assessment link or the start action.
    Single,
    /// Doctor share page, reached from a resolved short link.
    Share,
}

impl QuizMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Single => "single",
            Self::Share => "share",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved destination the quiz UI must navigate to.
///
/// `key` and `doctor_id` are rendered into the query string only when present.
/// A direct assessment link always carries both as `Some`, using an empty
/// string for the one the visitor's URL omitted, so the canonical URL shape
/// stays stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalQuizTarget {
    pub quiz_type: QuizType,
    pub doctor_id: Option<String>,
    pub key: Option<String>,
    pub mode: QuizMode,
}

impl CanonicalQuizTarget {
    /// Target for a direct assessment link. Absent parameters become empty strings.
    #[must_use]
    pub fn direct_link(quiz_type: QuizType, key: Option<String>, doctor_id: Option<String>) -> Self {
        Self {
            quiz_type,
            doctor_id: Some(doctor_id.unwrap_or_default()),
            key: Some(key.unwrap_or_default()),
            mode: QuizMode::Single,
        }
    }

    /// Target for the explicit "start quiz" action: single mode, no context.
    #[must_use]
    pub const fn start(quiz_type: QuizType) -> Self {
        Self { quiz_type, doctor_id: None, key: None, mode: QuizMode::Single }
    }

    /// Target for a resolved short link.
    #[must_use]
    pub fn share(quiz_type: QuizType, doctor_id: String) -> Self {
        Self { quiz_type, doctor_id: Some(doctor_id), key: None, mode: QuizMode::Share }
    }

    /// Path the navigation primitive should load.
    ///
    /// - `Single`: `/quiz?type=<CODE>[&key=..][&doctor=..]&mode=single`
    /// - `Share`: `/share/<slug>/<doctor>`
    #[must_use]
    pub fn path(&self) -> String {
        match self.mode {
            QuizMode::Single => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("type", self.quiz_type.code());
                if let Some(key) = &self.key {
                    query.append_pair("key", key);
                }
                if let Some(doctor) = &self.doctor_id {
                    query.append_pair("doctor", doctor);
                }
                query.append_pair("mode", self.mode.as_str());
                format!("/quiz?{}", query.finish())
            },
            QuizMode::Share => {
                let doctor = self.doctor_id.as_deref().unwrap_or_default();
                format!(
                    "/share/{}/{}",
                    self.quiz_type.slug(),
                    utf8_percent_encode(doctor, PATH_SEGMENT)
                )
            },
        }
    }
}

/// Where the bootstrap sends the visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationTarget {
    Quiz(CanonicalQuizTarget),
    NotFound,
}

impl NavigationTarget {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Quiz(target) => target.path(),
            Self::NotFound => NOT_FOUND_PATH.to_owned(),
        }
    }
}

impl From<CanonicalQuizTarget> for NavigationTarget {
    fn from(target: CanonicalQuizTarget) -> Self {
        Self::Quiz(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_link_path_carries_both_params() {
        let target = CanonicalQuizTarget::direct_link(
            QuizType::Dhi,
            Some("K1".to_owned()),
            Some("D1".to_owned()),
        );
        assert_eq!(target.path(), "/quiz?type=DHI&key=K1&doctor=D1&mode=single");
    }

    #[test]
    fn test_direct_link_keeps_absent_param_as_empty() {
        let target = CanonicalQuizTarget::direct_link(QuizType::Dhi, None, Some("D1".to_owned()));
        assert_eq!(target.path(), "/quiz?type=DHI&key=&doctor=D1&mode=single");
    }

    #[test]
    fn test_start_path_has_no_context() {
        let target = CanonicalQuizTarget::start(QuizType::Dhi);
        assert_eq!(target.path(), "/quiz?type=DHI&mode=single");
    }

    #[test]
    fn test_share_path_uses_slug() {
        let target = CanonicalQuizTarget::share(QuizType::Snot22, "d1".to_owned());
        assert_eq!(target.path(), "/share/snot22/d1");
    }

    #[test]
    fn test_query_and_path_values_are_escaped() {
        let target = CanonicalQuizTarget::direct_link(
            QuizType::Nose,
            Some("a&b=c".to_owned()),
            Some("dr smith".to_owned()),
        );
        assert_eq!(target.path(), "/quiz?type=NOSE&key=a%26b%3Dc&doctor=dr+smith&mode=single");

        let share = CanonicalQuizTarget::share(QuizType::Nose, "dr/smith".to_owned());
        assert_eq!(share.path(), "/share/nose/dr%2Fsmith");
    }

    #[test]
    fn test_not_found_path() {
        assert_eq!(NavigationTarget::NotFound.path(), "/404");
    }
}
