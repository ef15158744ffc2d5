// media-providers/src/http_adapter.rs
// ============================================================================
// Module: HTTP Provider Adapter
// Description: Generic JSON-over-HTTP news provider adapter.
// Purpose: Implement media_core::ProviderAdapter with retry and normalization.
// Dependencies: media-core, reqwest, serde_json, time
// ============================================================================

//! ## Overview
//! One instance is configured per news provider (distinct base URL, API key,
//! and response-shape parser); the retry/timeout/classification machinery is
//! shared. Grounded in the HTTP fetch shape of a single-attempt blocking
//! provider client, adapted here to async with the retry contract in §4.2.

use std::time::Instant;

use async_trait::async_trait;
use media_core::NormalizedArticle;
use media_core::ProviderAdapter;
use media_core::ProviderError;
use media_core::ProviderFetchResult;
use serde_json::Value;

use crate::canonicalize::canonicalize_url;
use crate::retry::PER_ATTEMPT_TIMEOUT;
use crate::retry::RetryPolicy;

/// Maximum title length after normalization.
pub const MAX_TITLE_LEN: usize = 500;
/// Maximum summary length after normalization.
pub const MAX_SUMMARY_LEN: usize = 2000;
/// Maximum content length after normalization.
pub const MAX_CONTENT_LEN: usize = 16_000;
/// Maximum URL length after normalization.
pub const MAX_URL_LEN: usize = 2048;

/// A parser translating one provider's JSON response shape into rows the
/// adapter can normalize. Kept separate from HTTP plumbing so each provider
/// only implements the part that differs.
pub trait ResponseParser: Send + Sync {
    /// Extracts raw article rows from a decoded JSON response body.
    ///
    /// # Errors
    /// Returns [`ProviderError::Schema`] when the response does not match the
    /// expected shape.
    fn parse_rows(&self, body: &Value) -> Result<Vec<Value>, ProviderError>;

    /// Builds a [`NormalizedArticle`] from one raw row, or `None` when the row
    /// is missing a required field (dropped rows are not an error).
    fn normalize_row(&self, row: &Value) -> Option<NormalizedArticle>;
}

/// Configuration for one provider's HTTP adapter.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Stable provider identifier, e.g. `reuters`.
    pub provider_id: String,
    /// Base query endpoint.
    pub endpoint: String,
    /// API key sent as a bearer token.
    pub api_key: String,
}

/// Generic HTTP-backed news provider adapter.
pub struct HttpProviderAdapter {
    config: HttpProviderConfig,
    client: reqwest::Client,
    parser: Box<dyn ResponseParser>,
}

impl HttpProviderAdapter {
    /// Builds a new adapter from configuration and a response parser.
    #[must_use]
    pub fn new(config: HttpProviderConfig, parser: Box<dyn ResponseParser>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PER_ATTEMPT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self { config, client, parser }
    }

    /// Builds the full request URL for `query` against this provider's endpoint.
    fn request_url(&self, query: &str) -> String {
        format!("{}?q={}", self.config.endpoint, urlencoding_light(query))
    }

    async fn fetch_once(&self, query: &str, term: &str, max_articles: u32) -> Result<ProviderFetchResult, ProviderError> {
        let started = Instant::now();
        let request_url = self.request_url(query);
        let response = self
            .client
            .get(&request_url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimit(format!("status {status}")));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::Auth(format!("status {status}")));
        }
        if status.is_server_error() {
            return Err(ProviderError::Upstream5xx(format!("status {status}")));
        }
        if !status.is_success() {
            return Err(ProviderError::Unknown(format!("status {status}")));
        }

        let body: Value = response.json().await.map_err(|err| ProviderError::Schema(err.to_string()))?;
        let rows = self.parser.parse_rows(&body)?;
        let raw_count = u32::try_from(rows.len()).unwrap_or(u32::MAX);

        let mut items = Vec::new();
        for row in &rows {
            let Some(article) = self.parser.normalize_row(row) else {
                continue;
            };
            let Some(article) = normalize_and_validate(article) else {
                continue;
            };
            items.push(article);
            if items.len() as u32 >= max_articles {
                break;
            }
        }

        Ok(ProviderFetchResult {
            provider: self.config.provider_id.clone(),
            term: term.to_string(),
            items,
            request_url,
            raw_count,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            error: None,
        })
    }
}

#[async_trait]
impl ProviderAdapter for HttpProviderAdapter {
    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    async fn fetch(&self, query: &str, term: &str, max_articles: u32) -> ProviderFetchResult {
        let provider = self.config.provider_id.clone();
        let term_owned = term.to_string();
        let outcome = RetryPolicy::run(|| self.fetch_once(query, term, max_articles)).await;
        match outcome {
            Ok(result) => result,
            Err(error) => ProviderFetchResult {
                provider,
                term: term_owned,
                items: vec![],
                request_url: self.request_url(query),
                raw_count: 0,
                duration_ms: 0,
                error: Some(error),
            },
        }
    }
}

/// Maps a `reqwest` transport failure to the provider error taxonomy.
fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_connect() {
        ProviderError::Upstream5xx(err.to_string())
    } else {
        ProviderError::Unknown(err.to_string())
    }
}

/// Trims and length-caps article fields, canonicalizes the URL, and rejects
/// an article left with an empty title or an unparseable URL.
fn normalize_and_validate(mut article: NormalizedArticle) -> Option<NormalizedArticle> {
    article.title = truncate(article.title.trim(), MAX_TITLE_LEN);
    if article.title.is_empty() {
        return None;
    }
    let canonical = canonicalize_url(&article.canonical_url).ok()?;
    article.canonical_url = truncate(&canonical, MAX_URL_LEN);
    article.summary = article.summary.map(|s| truncate(s.trim(), MAX_SUMMARY_LEN));
    article.content = article.content.map(|c| truncate(c.trim(), MAX_CONTENT_LEN));
    Some(article)
}

/// Truncates `value` to at most `max_len` characters.
fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        value.to_string()
    } else {
        value.chars().take(max_len).collect()
    }
}

/// Percent-encodes every non-alphanumeric ASCII character.
fn urlencoding_light(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_string() } else { format!("%{:02X}", c as u32) })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::normalize_and_validate;
    use media_core::NormalizedArticle;
    use std::collections::BTreeMap;

    fn article(title: &str, url: &str) -> NormalizedArticle {
        NormalizedArticle {
            canonical_url: url.to_string(),
            title: title.to_string(),
            source_name: None,
            source_id: None,
            author: None,
            summary: None,
            content: None,
            image_url: None,
            published_at: None,
            language: None,
            category: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn drops_rows_with_empty_title() {
        assert!(normalize_and_validate(article("   ", "https://example.com/a")).is_none());
    }

    #[test]
    fn drops_rows_with_uncanonicalizable_url() {
        assert!(normalize_and_validate(article("headline", "not a url")).is_none());
    }

    #[test]
    fn keeps_valid_rows_and_canonicalizes_url() {
        let normalized = normalize_and_validate(article("headline", "https://example.com/a/?x=1#f")).unwrap();
        assert_eq!(normalized.canonical_url, "https://example.com/a");
    }
}
