//! The fixed set of quizzes a funnel can serve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Assessment offered by a quiz funnel.
///
/// Serialized as its uppercase code (`"SNOT22"`). Parsing is case-insensitive
/// and ignores `-`, `_` and spaces, so `snot-22`, `Snot_22` and `SNOT22` all
/// name the same quiz.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub enum QuizType {
    /// Nasal Obstruction Symptom Evaluation (baseline quiz)
    Nose,
    /// Sino-Nasal Outcome Test, 22 items
    Snot22,
    /// Sino-Nasal Outcome Test, 12 items
    Snot12,
    /// Total Nasal Symptom Score
    Tnss,
    /// Dizziness Handicap Inventory
    Dhi,
    /// Hearing Handicap Inventory for Adults
    Hhia,
    /// Epworth Sleepiness Scale
    Epworth,
    /// STOP-BANG sleep apnea screening
    StopBang,
}

impl QuizType {
    pub const ALL_VARIANTS: &'static [QuizType] = &[
        QuizType::Nose,
        QuizType::Snot22,
        QuizType::Snot12,
        QuizType::Tnss,
        QuizType::Dhi,
        QuizType::Hhia,
        QuizType::Epworth,
        QuizType::StopBang,
    ];

    /// Uppercase code used in `/quiz?type=` query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match *self {
            Self::Nose => "NOSE",
            Self::Snot22 => "SNOT22",
            Self::Snot12 => "SNOT12",
            Self::Tnss => "TNSS",
            Self::Dhi => "DHI",
            Self::Hhia => "HHIA",
            Self::Epworth => "EPWORTH",
            Self::StopBang => "STOPBANG",
        }
    }

    /// Lowercase slug used in path segments and storage namespaces.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match *self {
            Self::Nose => "nose",
            Self::Snot22 => "snot22",
            Self::Snot12 => "snot12",
            Self::Tnss => "tnss",
            Self::Dhi => "dhi",
            Self::Hhia => "hhia",
            Self::Epworth => "epworth",
            Self::StopBang => "stopbang",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QuizType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL_VARIANTS
            .iter()
            .copied()
            .find(|quiz| quiz.slug() == normalized)
            .ok_or_else(|| CoreError::UnknownQuizType(s.to_owned()))
    }
}

impl TryFrom<String> for QuizType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuizType> for String {
    fn from(value: QuizType) -> Self {
        value.code().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_and_separator_insensitive() {
        assert_eq!("snot22".parse::<QuizType>().unwrap(), QuizType::Snot22);
        assert_eq!("SNOT-22".parse::<QuizType>().unwrap(), QuizType::Snot22);
        assert_eq!("Stop_Bang".parse::<QuizType>().unwrap(), QuizType::StopBang);
        assert_eq!("DHI".parse::<QuizType>().unwrap(), QuizType::Dhi);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "tinnitus".parse::<QuizType>().unwrap_err();
        assert_eq!(err, CoreError::UnknownQuizType("tinnitus".to_owned()));
        assert!("".parse::<QuizType>().is_err());
    }

    #[test]
    fn test_code_and_slug_name_the_same_variant() {
        for quiz in QuizType::ALL_VARIANTS {
            assert_eq!(quiz.code().parse::<QuizType>().unwrap(), *quiz);
            assert_eq!(quiz.slug().parse::<QuizType>().unwrap(), *quiz);
        }
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&QuizType::Snot22).unwrap();
        assert_eq!(json, "\"SNOT22\"");
        let parsed: QuizType = serde_json::from_str("\"dhi\"").unwrap();
        assert_eq!(parsed, QuizType::Dhi);
        assert!(serde_json::from_str::<QuizType>("\"bogus\"").is_err());
    }
}
