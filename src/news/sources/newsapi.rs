//! NewsAPI (newsapi.org) source.
//!
//! Breaking news maps to `/v2/top-headlines`, search maps to `/v2/everything`.
//! Both endpoints answer with the same envelope:
//!
//! ```text
//! { "status": "ok",    "totalResults": 38, "articles": [ ... ] }
//! { "status": "error", "code": "apiKeyInvalid", "message": "..." }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::news::{Article, NewsPage, NewsSource, SourceError};

pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    status: String,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    articles: Option<Vec<Article>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Picks the message to surface for a failed request: the API's own
/// `message` when the body carries one, else the HTTP reason phrase.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|env| env.message)
        .filter(|msg| !msg.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string())
}

// ============================================================================
// Source Implementation
// ============================================================================

pub struct NewsApiSource {
    api_key: Option<String>,
    base_url: String,
    page_size: u32,
    client: reqwest::Client,
}

impl NewsApiSource {
    /// Creates a NewsAPI source.
    ///
    /// # Arguments
    /// * `api_key` - NewsAPI key, sent as `X-Api-Key` (requests go out unauthenticated if None)
    /// * `base_url` - Optional custom base URL (defaults to newsapi.org)
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self::with_options(api_key, base_url, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                reqwest::Client::new()
            });

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_NEWSAPI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_key,
            base_url,
            page_size,
            client,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Issues a GET against `endpoint` and decodes the envelope into a page.
    async fn get_page(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<NewsPage, SourceError> {
        let url = format!("{}/v2/{}", self.base_url, endpoint);
        let mut request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("pageSize", self.page_size)]);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        debug!("NewsAPI response status for {}: {}", endpoint, status);

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!("NewsAPI error: {} - {}", status.as_u16(), message);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        if envelope.status != "ok" {
            let message = envelope
                .message
                .or(envelope.code)
                .unwrap_or_else(|| format!("unexpected status '{}'", envelope.status));
            warn!("NewsAPI reported an error in a {} response: {}", status, message);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let articles = envelope
            .articles
            .ok_or_else(|| SourceError::Parse("response has no articles".to_string()))?;

        info!(
            "NewsAPI {}: {} articles (total {})",
            endpoint,
            articles.len(),
            envelope.total_results
        );
        Ok(NewsPage::new(envelope.total_results, articles))
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn breaking_news(&self, country_code: &str, page: u32) -> Result<NewsPage, SourceError> {
        self.get_page(
            "top-headlines",
            &[("country", country_code.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn search_news(&self, query: &str, page: u32) -> Result<NewsPage, SourceError> {
        self.get_page(
            "everything",
            &[("q", query.to_string()), ("page", page.to_string())],
        )
        .await
    }
}
