//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::Notify;

use crate::core::bookmarks::JsonArticleStore;
use crate::core::connectivity::ConnectivityChecker;
use crate::news::{Article, ArticleSource, NewsPage, NewsSource, SourceError};

/// Builds an article whose title is `name` and whose URL is derived from it.
pub fn article(name: &str) -> Article {
    Article {
        source: ArticleSource {
            id: None,
            name: "Test Wire".to_string(),
        },
        author: None,
        title: name.to_string(),
        description: None,
        url: format!("https://news.example.com/{name}"),
        url_to_image: None,
        published_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        content: None,
    }
}

/// A page of `count` articles titled `{prefix}-0`, `{prefix}-1`, ...
pub fn page_of(prefix: &str, count: usize, total_results: u32) -> NewsPage {
    NewsPage::new(
        total_results,
        (0..count).map(|i| article(&format!("{prefix}-{i}"))).collect(),
    )
}

/// A bookmark store in a scratch directory. Keep the `TempDir` alive for the
/// duration of the test.
pub fn temp_store() -> (TempDir, Arc<JsonArticleStore>) {
    let dir = TempDir::new().unwrap();
    let store = JsonArticleStore::open(dir.path().join("saved.json")).unwrap();
    (dir, Arc::new(store))
}

/// Connectivity that reports whatever the test last set.
pub struct FixedConnectivity(AtomicBool);

impl FixedConnectivity {
    pub fn online() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(true)))
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::SeqCst);
    }
}

impl ConnectivityChecker for FixedConnectivity {
    fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Breaking { country_code: String, page: u32 },
    Search { query: String, page: u32 },
}

/// A source that answers from per-feed queues of canned results and records
/// every request. An exhausted queue answers with a network error.
#[derive(Default)]
pub struct ScriptedSource {
    breaking: Mutex<VecDeque<Result<NewsPage, SourceError>>>,
    search: Mutex<VecDeque<Result<NewsPage, SourceError>>>,
    calls: Mutex<Vec<SourceCall>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_breaking(self, result: Result<NewsPage, SourceError>) -> Self {
        self.breaking.lock().unwrap().push_back(result);
        self
    }

    pub fn with_search(self, result: Result<NewsPage, SourceError>) -> Self {
        self.search.lock().unwrap().push_back(result);
        self
    }

    /// Every request waits for a `notify_one()` on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(
        &self,
        call: SourceCall,
        queue: &Mutex<VecDeque<Result<NewsPage, SourceError>>>,
    ) -> Result<NewsPage, SourceError> {
        self.calls.lock().unwrap().push(call);
        match &self.gate {
            Some(gate) => gate.notified().await,
            // Give other tasks a chance to interleave, like a real request would
            None => tokio::task::yield_now().await,
        }
        let next = queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(SourceError::Network("script exhausted".to_string())))
    }
}

#[async_trait]
impl NewsSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn breaking_news(&self, country_code: &str, page: u32) -> Result<NewsPage, SourceError> {
        let call = SourceCall::Breaking {
            country_code: country_code.to_string(),
            page,
        };
        self.answer(call, &self.breaking).await
    }

    async fn search_news(&self, query: &str, page: u32) -> Result<NewsPage, SourceError> {
        let call = SourceCall::Search {
            query: query.to_string(),
            page,
        };
        self.answer(call, &self.search).await
    }
}
