use std::time::Duration;

use async_trait::async_trait;
use quizlink_core::{LookupConfig, ShortLinkMapping};

use crate::error::LookupError;
use crate::ShortLinkLookup;

/// Table endpoint holding short-link mappings.
pub const SHORT_LINKS_PATH: &str = "/rest/v1/short_links";

/// Client for the hosted short-link table.
///
/// Built once from [`LookupConfig`] and shared; performs exactly one request
/// per lookup and never retries.
pub struct HttpLookupClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

impl std::fmt::Debug for HttpLookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLookupClient")
            .field("client", &self.client)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpLookupClient {
    /// Creates a client from process configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        Self::with_timeout(config.api_key.clone(), config.base_url.clone(), config.timeout)
    }

    /// Creates a client with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn with_timeout(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::ClientInit(e.to_string()))?;
        Ok(Self { client, api_key, base_url })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ShortLinkLookup for HttpLookupClient {
    async fn lookup(&self, short_id: &str) -> Result<Option<ShortLinkMapping>, LookupError> {
        let filter = format!("eq.{short_id}");
        let response = self
            .client
            .get(format!("{}{SHORT_LINKS_PATH}", self.base_url))
            .query(&[
                ("short_id", filter.as_str()),
                ("select", "short_id,doctor_id,quiz_type"),
                ("limit", "1"),
            ])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            return Err(LookupError::HttpStatus {
                code: status.as_u16(),
                body: truncate(&body, 200).to_owned(),
            });
        }

        let body = response.text().await?;
        let rows: Vec<ShortLinkMapping> =
            serde_json::from_str(&body).map_err(|e| LookupError::JsonParse {
                context: format!("short link response (body: {})", truncate(&body, 200)),
                source: e,
            })?;
        Ok(rows.into_iter().next())
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
