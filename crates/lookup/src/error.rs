//! Typed error enum for the lookup crate.

use thiserror::Error;

/// Errors from short-link lookups.
///
/// Callers resolving links treat every variant like a missing mapping;
/// the distinction exists for logs.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("lookup service not configured")]
    NotConfigured,
}

impl LookupError {
    /// Whether the request never completed within the client timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HttpRequest(e) if e.is_timeout())
    }
}
