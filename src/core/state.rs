//! # Newsroom
//!
//! The state holder a UI talks to. It owns two independent feeds and
//! publishes a status for each one.
//!
//! ```text
//! Newsroom
//! ├── source: Arc<dyn NewsSource>                 // remote pages
//! ├── store: Arc<dyn ArticleStore>                // bookmarks
//! ├── connectivity: Arc<dyn ConnectivityChecker>  // pre-flight check
//! ├── breaking: FeedSlot                          // Feed + status channel
//! ├── search: FeedSlot                            // Feed + status channel
//! └── tasks: Vec<AbortHandle>                     // aborted on shutdown/drop
//! ```
//!
//! Every fetch runs as its own task:
//!
//! ```text
//! lock feed ─► Loading ─► online? ──no──► Error(NoConnection)
//!                            │yes
//!                            ▼
//!                      source request ──err──► Error(NetworkFailure | ConversionError | Server)
//!                            │ok
//!                            ▼
//!                   merge, page += 1 ─► Success(accumulated)
//! ```
//!
//! The feed lock is held for the whole pipeline, so two fetches on the same
//! feed run one after the other and the second asks for the next page.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};

use log::{debug, info, warn};
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};

use crate::core::bookmarks::ArticleStore;
use crate::core::connectivity::ConnectivityChecker;
use crate::core::feed::Feed;
use crate::core::status::{FetchError, Status};
use crate::news::{Article, NewsPage, NewsSource};

/// What observers of a feed see. `None` until the first fetch starts.
pub type FeedStatus = Option<Status<NewsPage>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedRequest {
    Breaking { country_code: String },
    Search { query: String },
}

impl fmt::Display for FeedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedRequest::Breaking { country_code } => write!(f, "breaking news ({country_code})"),
            FeedRequest::Search { query } => write!(f, "search '{query}'"),
        }
    }
}

struct FeedSlot {
    feed: Mutex<Feed>,
    status: watch::Sender<FeedStatus>,
}

impl FeedSlot {
    fn new() -> Arc<Self> {
        let (status, _rx) = watch::channel(None);
        Arc::new(Self {
            feed: Mutex::new(Feed::new()),
            status,
        })
    }

    fn publish(&self, status: Status<NewsPage>) {
        self.status.send_replace(Some(status));
    }
}

pub struct Newsroom {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn ArticleStore>,
    connectivity: Arc<dyn ConnectivityChecker>,
    breaking: Arc<FeedSlot>,
    search: Arc<FeedSlot>,
    tasks: StdMutex<Vec<AbortHandle>>,
}

impl Newsroom {
    /// Fetch, save and delete spawn Tokio tasks, so the newsroom must be
    /// used from within a runtime.
    pub fn new(
        source: Arc<dyn NewsSource>,
        store: Arc<dyn ArticleStore>,
        connectivity: Arc<dyn ConnectivityChecker>,
    ) -> Self {
        info!("Newsroom created with source '{}'", source.name());
        Self {
            source,
            store,
            connectivity,
            breaking: FeedSlot::new(),
            search: FeedSlot::new(),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    /// Creates a newsroom and immediately starts loading breaking news for
    /// `country_code`.
    pub fn launch(
        source: Arc<dyn NewsSource>,
        store: Arc<dyn ArticleStore>,
        connectivity: Arc<dyn ConnectivityChecker>,
        country_code: &str,
    ) -> Self {
        let newsroom = Self::new(source, store, connectivity);
        newsroom.fetch_breaking_news(country_code);
        newsroom
    }

    // -- feeds ---------------------------------------------------------------

    /// Fetches the next page of breaking news. Progress is published on
    /// [`Self::breaking_news_status`]; the returned handle may be awaited or
    /// dropped.
    pub fn fetch_breaking_news(&self, country_code: &str) -> JoinHandle<()> {
        let request = FeedRequest::Breaking {
            country_code: country_code.to_string(),
        };
        self.spawn(run_fetch(
            self.breaking.clone(),
            self.source.clone(),
            self.connectivity.clone(),
            request,
        ))
    }

    /// Fetches search results for `query`. Repeating the last query loads its
    /// next page; a new query starts over from page 1 and replaces the results.
    pub fn search_news(&self, query: &str) -> JoinHandle<()> {
        let request = FeedRequest::Search {
            query: query.to_string(),
        };
        self.spawn(run_fetch(
            self.search.clone(),
            self.source.clone(),
            self.connectivity.clone(),
            request,
        ))
    }

    pub fn breaking_news_status(&self) -> watch::Receiver<FeedStatus> {
        self.breaking.status.subscribe()
    }

    pub fn search_news_status(&self) -> watch::Receiver<FeedStatus> {
        self.search.status.subscribe()
    }

    /// The page the next breaking-news fetch will request. Waits for an
    /// in-flight fetch on that feed to finish.
    pub async fn breaking_news_page(&self) -> u32 {
        self.breaking.feed.lock().await.page()
    }

    pub async fn search_news_page(&self) -> u32 {
        self.search.feed.lock().await.page()
    }

    pub async fn last_search_query(&self) -> Option<String> {
        self.search.feed.lock().await.last_query().map(str::to_string)
    }

    /// True once every breaking-news page the server reported was loaded.
    pub async fn is_last_breaking_page(&self, page_size: u32) -> bool {
        self.breaking.feed.lock().await.is_last_page(page_size)
    }

    pub async fn is_last_search_page(&self, page_size: u32) -> bool {
        self.search.feed.lock().await.is_last_page(page_size)
    }

    // -- bookmarks -----------------------------------------------------------

    /// Bookmarks `article`, replacing any saved copy with the same URL.
    /// Failures are logged, never reported.
    pub fn save_article(&self, article: Article) -> JoinHandle<()> {
        let store = self.store.clone();
        self.spawn(async move {
            if let Err(e) = store.upsert(&article).await {
                warn!("Failed to save article {}: {}", article.url, e);
            }
        })
    }

    pub fn delete_article(&self, article: Article) -> JoinHandle<()> {
        let store = self.store.clone();
        self.spawn(async move {
            if let Err(e) = store.delete(&article).await {
                warn!("Failed to delete article {}: {}", article.url, e);
            }
        })
    }

    /// Live list of bookmarks, straight from the store.
    pub fn saved_articles(&self) -> watch::Receiver<Vec<Article>> {
        self.store.saved()
    }

    // -- lifetime ------------------------------------------------------------

    /// Aborts every task still running. Aborted fetches publish nothing more.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let running = tasks.iter().filter(|t| !t.is_finished()).count();
        if running > 0 {
            debug!("Aborting {} in-flight tasks", running);
        }
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle.abort_handle());
        handle
    }
}

impl Drop for Newsroom {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_fetch(
    slot: Arc<FeedSlot>,
    source: Arc<dyn NewsSource>,
    connectivity: Arc<dyn ConnectivityChecker>,
    request: FeedRequest,
) {
    let mut feed = slot.feed.lock().await;
    slot.publish(Status::Loading);

    if !connectivity.is_connected() {
        info!("Skipping {}: no internet connection", request);
        slot.publish(Status::Error(FetchError::NoConnection));
        return;
    }

    let page = match &request {
        FeedRequest::Breaking { .. } => feed.page(),
        FeedRequest::Search { query } => feed.page_for_query(query),
    };
    debug!("Requesting {} page {}", request, page);

    let result = match &request {
        FeedRequest::Breaking { country_code } => source.breaking_news(country_code, page).await,
        FeedRequest::Search { query } => source.search_news(query, page).await,
    };

    match result {
        Ok(news) => {
            let received = news.len();
            let accumulated = match &request {
                FeedRequest::Breaking { .. } => feed.append(news),
                FeedRequest::Search { query } => feed.merge_search(query, news),
            }
            .clone();
            info!(
                "{} page {}: {} new, {} total",
                request,
                page,
                received,
                accumulated.len()
            );
            slot.publish(Status::Success(accumulated));
        }
        Err(e) => {
            warn!("{} page {} failed: {}", request, page, e);
            slot.publish(Status::Error(e.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::SourceError;
    use crate::test_support::{
        FixedConnectivity, ScriptedSource, SourceCall, article, page_of, temp_store,
    };
    use tokio::sync::Notify;

    fn newsroom(
        source: &Arc<ScriptedSource>,
        connectivity: &Arc<FixedConnectivity>,
    ) -> (tempfile::TempDir, Newsroom) {
        let (dir, store) = temp_store();
        let room = Newsroom::new(source.clone(), store, connectivity.clone());
        (dir, room)
    }

    fn current(rx: &watch::Receiver<FeedStatus>) -> FeedStatus {
        rx.borrow().clone()
    }

    fn breaking(country_code: &str, page: u32) -> SourceCall {
        SourceCall::Breaking {
            country_code: country_code.to_string(),
            page,
        }
    }

    fn search(query: &str, page: u32) -> SourceCall {
        SourceCall::Search {
            query: query.to_string(),
            page,
        }
    }

    #[tokio::test]
    async fn test_status_starts_empty() {
        let source = Arc::new(ScriptedSource::new());
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        assert_eq!(current(&room.breaking_news_status()), None);
        assert_eq!(current(&room.search_news_status()), None);
        assert_eq!(room.breaking_news_page().await, 1);
    }

    #[tokio::test]
    async fn test_breaking_news_accumulates_pages() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("p1", 20, 38)))
                .with_breaking(Ok(page_of("p2", 18, 38))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let rx = room.breaking_news_status();

        room.fetch_breaking_news("us").await.unwrap();
        let Some(Status::Success(page)) = current(&rx) else {
            panic!("expected success, got {:?}", current(&rx));
        };
        assert_eq!(page.len(), 20);
        assert_eq!(room.breaking_news_page().await, 2);

        room.fetch_breaking_news("us").await.unwrap();
        let Some(Status::Success(page)) = current(&rx) else {
            panic!("expected success, got {:?}", current(&rx));
        };
        assert_eq!(page.len(), 38);
        assert_eq!(page.articles[0].title, "p1-0");
        assert_eq!(page.articles[37].title, "p2-17");
        assert_eq!(room.breaking_news_page().await, 3);
        assert!(room.is_last_breaking_page(20).await);

        assert_eq!(source.calls(), vec![breaking("us", 1), breaking("us", 2)]);
    }

    #[tokio::test]
    async fn test_search_new_query_replaces_results() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_search(Ok(page_of("cats", 10, 40)))
                .with_search(Ok(page_of("dogs", 5, 5))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let rx = room.search_news_status();

        room.search_news("cats").await.unwrap();
        assert_eq!(current(&rx).unwrap().data().unwrap().len(), 10);
        assert_eq!(room.last_search_query().await.as_deref(), Some("cats"));

        room.search_news("dogs").await.unwrap();
        let status = current(&rx).unwrap();
        let page = status.data().unwrap();
        assert_eq!(page.len(), 5);
        assert!(page.articles.iter().all(|a| a.title.starts_with("dogs")));
        assert_eq!(room.last_search_query().await.as_deref(), Some("dogs"));
        assert_eq!(room.search_news_page().await, 2);

        assert_eq!(source.calls(), vec![search("cats", 1), search("dogs", 1)]);
    }

    #[tokio::test]
    async fn test_search_same_query_appends() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_search(Ok(page_of("rust-a", 10, 25)))
                .with_search(Ok(page_of("rust-b", 10, 25))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());

        room.search_news("rust").await.unwrap();
        room.search_news("rust").await.unwrap();

        let status = current(&room.search_news_status()).unwrap();
        assert_eq!(status.data().unwrap().len(), 20);
        assert!(!room.is_last_search_page(10).await);
        assert_eq!(source.calls(), vec![search("rust", 1), search("rust", 2)]);
    }

    #[tokio::test]
    async fn test_offline_publishes_no_connection_and_keeps_state() {
        let connectivity = FixedConnectivity::online();
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("p1", 20, 60)))
                .with_breaking(Ok(page_of("p2", 20, 60))),
        );
        let (_dir, room) = newsroom(&source, &connectivity);
        let rx = room.breaking_news_status();
        room.fetch_breaking_news("us").await.unwrap();

        connectivity.set(false);
        room.fetch_breaking_news("us").await.unwrap();
        let status = current(&rx).unwrap();
        assert_eq!(status, Status::Error(FetchError::NoConnection));
        assert_eq!(status.error_message().as_deref(), Some("No internet connection"));
        assert_eq!(room.breaking_news_page().await, 2);
        assert_eq!(source.calls().len(), 1);

        connectivity.set(true);
        room.fetch_breaking_news("us").await.unwrap();
        assert_eq!(current(&rx).unwrap().data().unwrap().len(), 40);
        assert_eq!(source.calls(), vec![breaking("us", 1), breaking("us", 2)]);
    }

    #[tokio::test]
    async fn test_search_while_offline_records_nothing() {
        let connectivity = FixedConnectivity::offline();
        let source = Arc::new(ScriptedSource::new().with_search(Ok(page_of("cats", 5, 5))));
        let (_dir, room) = newsroom(&source, &connectivity);

        room.search_news("cats").await.unwrap();
        assert_eq!(
            current(&room.search_news_status()),
            Some(Status::Error(FetchError::NoConnection))
        );
        assert_eq!(room.last_search_query().await, None);
        assert_eq!(room.search_news_page().await, 1);
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_source_errors_map_to_messages() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Err(SourceError::Network("timed out".to_string())))
                .with_breaking(Err(SourceError::Parse("expected value".to_string())))
                .with_breaking(Err(SourceError::Api {
                    status: 429,
                    message: "You have made too many requests.".to_string(),
                })),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let rx = room.breaking_news_status();

        let mut messages = Vec::new();
        for _ in 0..3 {
            room.fetch_breaking_news("us").await.unwrap();
            messages.push(current(&rx).unwrap().error_message().unwrap());
        }
        assert_eq!(
            messages,
            vec![
                "Network Failure",
                "Conversion error",
                "You have made too many requests."
            ]
        );
        // Failures never advance the page
        assert_eq!(room.breaking_news_page().await, 1);
        assert_eq!(
            source.calls(),
            vec![breaking("us", 1), breaking("us", 1), breaking("us", 1)]
        );
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_topic() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_search(Ok(page_of("cats", 10, 30)))
                .with_search(Err(SourceError::Network("reset".to_string())))
                .with_search(Ok(page_of("cats-more", 10, 30))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());

        room.search_news("cats").await.unwrap();
        room.search_news("dogs").await.unwrap();
        assert_eq!(room.last_search_query().await.as_deref(), Some("cats"));

        room.search_news("cats").await.unwrap();
        let status = current(&room.search_news_status()).unwrap();
        assert_eq!(status.data().unwrap().len(), 20);
        assert_eq!(
            source.calls(),
            vec![search("cats", 1), search("dogs", 1), search("cats", 2)]
        );
    }

    #[tokio::test]
    async fn test_loading_is_published_before_response() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("p1", 3, 3)))
                .gated(gate.clone()),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let mut rx = room.breaking_news_status();

        let handle = room.fetch_breaking_news("gb");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(Status::Loading));

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(current(&rx).unwrap().data().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_serialized() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("p1", 20, 40)))
                .with_breaking(Ok(page_of("p2", 20, 40))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());

        let first = room.fetch_breaking_news("us");
        let second = room.fetch_breaking_news("us");
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(source.calls(), vec![breaking("us", 1), breaking("us", 2)]);
        let status = current(&room.breaking_news_status()).unwrap();
        let page = status.data().unwrap();
        assert_eq!(page.len(), 40);
        assert_eq!(page.articles[20].title, "p2-0");
        assert_eq!(room.breaking_news_page().await, 3);
    }

    #[tokio::test]
    async fn test_feeds_are_independent() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("top", 5, 5)))
                .with_search(Ok(page_of("found", 2, 2))),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());

        room.fetch_breaking_news("us").await.unwrap();
        assert_eq!(current(&room.search_news_status()), None);
        assert_eq!(room.search_news_page().await, 1);

        room.search_news("found").await.unwrap();
        let breaking_status = current(&room.breaking_news_status()).unwrap();
        assert_eq!(breaking_status.data().unwrap().len(), 5);
        assert_eq!(room.breaking_news_page().await, 2);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_in_flight_fetch() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(
            ScriptedSource::new()
                .with_breaking(Ok(page_of("never", 1, 1)))
                .gated(gate.clone()),
        );
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let mut rx = room.breaking_news_status();

        let handle = room.fetch_breaking_news("us");
        rx.changed().await.unwrap();
        room.shutdown();

        let err = handle.await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(current(&rx), Some(Status::Loading));
        assert_eq!(room.breaking_news_page().await, 1);
    }

    #[tokio::test]
    async fn test_launch_starts_breaking_fetch() {
        let source = Arc::new(ScriptedSource::new().with_breaking(Ok(page_of("p1", 4, 4))));
        let (_dir, store) = temp_store();
        let room = Newsroom::launch(source.clone(), store, FixedConnectivity::online(), "us");

        let mut rx = room.breaking_news_status();
        while !matches!(*rx.borrow_and_update(), Some(Status::Success(_))) {
            rx.changed().await.unwrap();
        }
        assert_eq!(source.calls(), vec![breaking("us", 1)]);
    }

    #[tokio::test]
    async fn test_bookmarks_pass_through_store() {
        let source = Arc::new(ScriptedSource::new());
        let (_dir, room) = newsroom(&source, &FixedConnectivity::online());
        let saved = room.saved_articles();

        room.save_article(article("keeper")).await.unwrap();
        room.save_article(article("passing")).await.unwrap();
        assert_eq!(saved.borrow().len(), 2);

        room.delete_article(article("passing")).await.unwrap();
        let titles: Vec<String> = saved.borrow().iter().map(|a| a.title.clone()).collect();
        assert_eq!(titles, vec!["keeper"]);
    }
}
