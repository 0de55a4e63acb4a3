use axum::Json;
use axum::extract::{Path, RawQuery};
use axum::response::{IntoResponse, Redirect, Response};
use quizlink_core::{QueryParams, QuizType};
use quizlink_service::DeepLinkDecision;
use quizlink_service::deep_link;

use crate::api_error::ApiError;
use crate::response_types::LandingResponse;

/// `GET /assessment/{quiz}`: redirect deep links to the canonical quiz URL,
/// otherwise describe the entry page and its start action.
pub async fn entry(
    Path(quiz): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let quiz_type: QuizType = quiz.parse()?;
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());
    match deep_link::normalize(quiz_type, &params)? {
        DeepLinkDecision::Redirect { target } => Ok(Redirect::to(&target.path()).into_response()),
        DeepLinkDecision::Stay { start } => Ok(Json(LandingResponse {
            quiz_type: start.quiz_type,
            start_url: start.path(),
        })
        .into_response()),
    }
}
