//! Short-link resolution: one lookup, fail closed.

use std::sync::Arc;

use quizlink_core::constants::{BASELINE_QUIZ_TYPE, MAX_SHORT_CODE_LEN};
use quizlink_core::{CanonicalQuizTarget, NavigationTarget, QuizType, ShortLinkMapping};
use quizlink_lookup::ShortLinkLookup;
use serde::Serialize;

use crate::error::ServiceError;

/// Result of resolving one short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShortLinkOutcome {
    Resolved { target: CanonicalQuizTarget },
    /// No mapping, lookup failure, or a code that was never looked up.
    NotFound,
    /// The mapping names a quiz type that does not exist.
    UnknownQuizType { quiz_type: String },
}

impl ShortLinkOutcome {
    /// Where the visitor goes. Unknown quiz types have no destination; the UI
    /// renders "quiz not found" in place.
    #[must_use]
    pub fn navigation(&self) -> Option<NavigationTarget> {
        match self {
            Self::Resolved { target } => Some(NavigationTarget::Quiz(target.clone())),
            Self::NotFound => Some(NavigationTarget::NotFound),
            Self::UnknownQuizType { .. } => None,
        }
    }
}

/// Resolves short codes against the injected lookup service.
#[derive(Clone)]
pub struct ShortLinkResolver {
    lookup: Arc<dyn ShortLinkLookup>,
}

impl std::fmt::Debug for ShortLinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortLinkResolver").finish_non_exhaustive()
    }
}

impl ShortLinkResolver {
    #[must_use]
    pub fn new(lookup: Arc<dyn ShortLinkLookup>) -> Self {
        Self { lookup }
    }

    /// Raw mapping for `code`, with lookup failures surfaced.
    ///
    /// Blank and overlong codes return `Ok(None)` without a lookup.
    pub async fn fetch(&self, code: &str) -> Result<Option<ShortLinkMapping>, ServiceError> {
        let Some(code) = normalize_code(code) else {
            return Ok(None);
        };
        Ok(self.lookup.lookup(code).await?)
    }

    /// Resolve `code` with exactly one lookup. Errors and empty results both
    /// become [`ShortLinkOutcome::NotFound`].
    pub async fn resolve(&self, code: &str) -> ShortLinkOutcome {
        match self.fetch(code).await {
            Ok(Some(mapping)) => interpret(mapping),
            Ok(None) => {
                tracing::info!(short_code = code, "Short link has no mapping");
                ShortLinkOutcome::NotFound
            },
            Err(e) => {
                tracing::warn!(short_code = code, error = %e, "Short link lookup failed");
                ShortLinkOutcome::NotFound
            },
        }
    }
}

fn normalize_code(code: &str) -> Option<&str> {
    let code = code.trim();
    (!code.is_empty() && code.len() <= MAX_SHORT_CODE_LEN).then_some(code)
}

/// Turn a found mapping into its share target. Mappings without a quiz type
/// predate multi-quiz support and resolve to the baseline quiz.
fn interpret(mapping: ShortLinkMapping) -> ShortLinkOutcome {
    let raw_type = mapping.quiz_type.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let quiz_type = match raw_type {
        None => BASELINE_QUIZ_TYPE,
        Some(raw) => match raw.parse::<QuizType>() {
            Ok(quiz_type) => quiz_type,
            Err(_) => {
                tracing::warn!(short_code = %mapping.short_id, quiz_type = raw, "Short link names unknown quiz type");
                return ShortLinkOutcome::UnknownQuizType { quiz_type: raw.to_owned() };
            },
        },
    };
    ShortLinkOutcome::Resolved {
        target: CanonicalQuizTarget::share(quiz_type, mapping.doctor_id),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use quizlink_lookup::{InMemoryLookup, LookupError, UnconfiguredLookup};

    use super::*;

    fn mapping(short_id: &str, doctor_id: &str, quiz_type: Option<&str>) -> ShortLinkMapping {
        ShortLinkMapping {
            short_id: short_id.to_owned(),
            doctor_id: doctor_id.to_owned(),
            quiz_type: quiz_type.map(str::to_owned),
        }
    }

    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ShortLinkLookup for CountingLookup {
        async fn lookup(&self, _short_id: &str) -> Result<Option<ShortLinkMapping>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LookupError::HttpStatus { code: 500, body: String::new() })
        }
    }

    #[tokio::test]
    async fn test_resolves_to_share_path() {
        let lookup = InMemoryLookup::with_mappings([mapping("abc123", "d1", Some("snot22"))]);
        let resolver = ShortLinkResolver::new(Arc::new(lookup));
        let outcome = resolver.resolve("abc123").await;
        assert_eq!(outcome.navigation().unwrap().path(), "/share/snot22/d1");
    }

    #[tokio::test]
    async fn test_missing_mapping_is_not_found() {
        let resolver = ShortLinkResolver::new(Arc::new(InMemoryLookup::new()));
        let outcome = resolver.resolve("zzz").await;
        assert_eq!(outcome, ShortLinkOutcome::NotFound);
        assert_eq!(outcome.navigation().unwrap().path(), "/404");
    }

    #[tokio::test]
    async fn test_lookup_error_matches_empty_result() {
        let empty = ShortLinkResolver::new(Arc::new(InMemoryLookup::new())).resolve("abc").await;
        let failing = ShortLinkResolver::new(Arc::new(UnconfiguredLookup)).resolve("abc").await;
        assert_eq!(empty, failing);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let lookup = Arc::new(CountingLookup::default());
        let resolver = ShortLinkResolver::new(Arc::clone(&lookup) as Arc<dyn ShortLinkLookup>);
        assert_eq!(resolver.resolve("abc").await, ShortLinkOutcome::NotFound);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_and_overlong_codes_skip_lookup() {
        let lookup = Arc::new(CountingLookup::default());
        let resolver = ShortLinkResolver::new(Arc::clone(&lookup) as Arc<dyn ShortLinkLookup>);
        assert_eq!(resolver.resolve("   ").await, ShortLinkOutcome::NotFound);
        assert_eq!(resolver.resolve(&"x".repeat(MAX_SHORT_CODE_LEN + 1)).await, ShortLinkOutcome::NotFound);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_legacy_mapping_defaults_to_baseline() {
        let outcome = interpret(mapping("old", "d9", None));
        assert_eq!(outcome.navigation().unwrap().path(), "/share/nose/d9");
        let blank = interpret(mapping("old", "d9", Some("  ")));
        assert_eq!(blank, outcome);
    }

    #[test]
    fn test_unknown_quiz_type_has_no_destination() {
        let outcome = interpret(mapping("abc", "d1", Some("bogus")));
        assert_eq!(outcome, ShortLinkOutcome::UnknownQuizType { quiz_type: "bogus".to_owned() });
        assert_eq!(outcome.navigation(), None);
    }
}
