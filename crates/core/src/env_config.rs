//! Environment-driven configuration with warn-level logging for invalid values.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_CHANGE_POLL_INTERVAL, DEFAULT_LOOKUP_TIMEOUT};
use crate::error::{CoreError, Result};

pub const ENV_LOOKUP_URL: &str = "QUIZLINK_LOOKUP_URL";
pub const ENV_LOOKUP_KEY: &str = "QUIZLINK_LOOKUP_KEY";
pub const ENV_LOOKUP_TIMEOUT_SECS: &str = "QUIZLINK_LOOKUP_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "QUIZLINK_DATA_DIR";
pub const ENV_CHANGE_POLL_MS: &str = "QUIZLINK_CHANGE_POLL_MS";

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + fmt::Display>(var: &str, default: T) -> T {
    parse_with_default(var, std::env::var(var).ok(), default)
}

/// Same as [`env_parse_with_default`] for an already-read raw value.
pub fn parse_with_default<T: std::str::FromStr + fmt::Display>(
    var: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// Connection settings of the short-link lookup service.
#[derive(Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for LookupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Process-wide configuration, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` when the lookup service is not configured; short links then fail closed.
    pub lookup: Option<LookupConfig>,
    pub data_dir: PathBuf,
    pub change_poll_interval: Duration,
}

impl AppConfig {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = match (non_blank(vars(ENV_LOOKUP_URL)), non_blank(vars(ENV_LOOKUP_KEY))) {
            (Some(base_url), Some(api_key)) => {
                let secs = parse_with_default(
                    ENV_LOOKUP_TIMEOUT_SECS,
                    vars(ENV_LOOKUP_TIMEOUT_SECS),
                    DEFAULT_LOOKUP_TIMEOUT.as_secs(),
                );
                Some(LookupConfig {
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    api_key,
                    timeout: Duration::from_secs(secs.max(1)),
                })
            },
            (Some(_), None) => {
                tracing::warn!("{ENV_LOOKUP_URL} set without {ENV_LOOKUP_KEY}, short links disabled");
                None
            },
            _ => None,
        };

        let data_dir = non_blank(vars(ENV_DATA_DIR)).map_or_else(default_data_dir, PathBuf::from);
        let poll_ms = parse_with_default(
            ENV_CHANGE_POLL_MS,
            vars(ENV_CHANGE_POLL_MS),
            u64::try_from(DEFAULT_CHANGE_POLL_INTERVAL.as_millis()).unwrap_or(250),
        );

        Self { lookup, data_dir, change_poll_interval: Duration::from_millis(poll_ms.max(10)) }
    }

    /// The lookup settings, or an error naming the missing variable.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingConfig`] when the lookup service is not configured.
    pub fn require_lookup(&self) -> Result<&LookupConfig> {
        self.lookup.as_ref().ok_or(CoreError::MissingConfig(ENV_LOOKUP_URL))
    }

    /// Path of the durable storage origin database.
    #[must_use]
    pub fn origin_db_path(&self) -> PathBuf {
        self.data_dir.join("origin.db")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("quizlink")
}
