use quizlink_core::QuizType;
use quizlink_service::ShortLinkOutcome;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[non_exhaustive]
pub struct VersionResponse {
    pub version: &'static str,
}

/// JSON view of one short-link resolution.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub code: String,
    #[serde(flatten)]
    pub outcome: ShortLinkOutcome,
    /// Where the visitor would be sent; absent for unknown quiz types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Entry page payload when no redirect is needed.
#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub quiz_type: QuizType,
    pub start_url: String,
}
