use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised while interpreting quiz identities and routes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown quiz type: {0}")]
    UnknownQuizType(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

pub type Result<T> = StdResult<T, CoreError>;
