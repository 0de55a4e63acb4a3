//! Typed API error for HTTP handlers.
//!
//! Converts domain errors into HTTP responses with a JSON body:
//! `{"error": "message"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizlink_core::CoreError;
use quizlink_service::ServiceError;

/// `Internal` logs the real error server-side and returns a static message.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request: invalid input from caller.
    BadRequest(String),
    /// 404 Not Found: unknown quiz or resource.
    NotFound(String),
    /// 500 Internal Server Error: unexpected failure. Details logged, not exposed.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            },
        };
        let body = serde_json::json!({"error": message});
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownQuizType(quiz) => Self::NotFound(format!("quiz not found: {quiz}")),
            CoreError::InvalidRoute(route) => Self::BadRequest(format!("invalid route: {route}")),
            CoreError::MissingConfig(_) => Self::Internal(err.into()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::NoActiveSession => Self::NotFound(err.to_string()),
            _ => Self::Internal(err.into()),
        }
    }
}
