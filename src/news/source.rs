use std::fmt;

use async_trait::async_trait;

use super::types::NewsPage;

/// Errors a news source can report for a single page request.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Transport-level failure (timeout, DNS, connection refused, body read).
    Network(String),
    /// The response arrived but its payload could not be decoded.
    Parse(String),
    /// The API answered with an error response.
    Api { status: u16, message: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Network(msg) => write!(f, "network error: {msg}"),
            SourceError::Parse(msg) => write!(f, "parse error: {msg}"),
            SourceError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// A remote provider of paginated news. Pages are 1-based.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the source.
    fn name(&self) -> &str;

    /// Fetches one page of top headlines for an ISO 3166 country code.
    async fn breaking_news(&self, country_code: &str, page: u32) -> Result<NewsPage, SourceError>;

    /// Fetches one page of articles matching `query`.
    async fn search_news(&self, query: &str, page: u32) -> Result<NewsPage, SourceError>;
}
