//! # Bookmarks
//!
//! Saved articles, keyed by URL. The newsroom only forwards to an
//! [`ArticleStore`]; how the store persists is its own business.
//!
//! [`JsonArticleStore`] keeps the whole list in one JSON file
//! (`~/.headlines/saved_articles.json` by default). Writes use atomic rename
//! (write `.tmp`, then `rename()`) for crash safety.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::news::Article;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "bookmark store I/O error: {e}"),
            StoreError::Parse(e) => write!(f, "bookmark store JSON error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Parse(e)
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Inserts the article, or replaces the saved copy with the same URL.
    async fn upsert(&self, article: &Article) -> Result<(), StoreError>;

    /// Removes the saved article with the same URL, if any.
    async fn delete(&self, article: &Article) -> Result<(), StoreError>;

    /// Live view of the saved articles. Receivers see every committed change.
    fn saved(&self) -> watch::Receiver<Vec<Article>>;
}

pub struct JsonArticleStore {
    path: PathBuf,
    articles: Mutex<Vec<Article>>,
    tx: watch::Sender<Vec<Article>>,
}

impl JsonArticleStore {
    /// Opens the store at `path`. A missing file is an empty store; a
    /// malformed one is an error rather than silently discarded bookmarks.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let articles: Vec<Article> = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            Vec::new()
        };
        info!("Opened bookmark store at {} ({} saved)", path.display(), articles.len());

        let (tx, _rx) = watch::channel(articles.clone());
        Ok(Self {
            path,
            articles: Mutex::new(articles),
            tx,
        })
    }

    /// Persists `next`, then makes it the current list. The in-memory list is
    /// only replaced once the file write succeeded.
    async fn commit(
        &self,
        current: &mut Vec<Article>,
        next: Vec<Article>,
    ) -> Result<(), StoreError> {
        atomic_write_json(&self.path, &next).await?;
        *current = next;
        self.tx.send_replace(current.clone());
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for JsonArticleStore {
    async fn upsert(&self, article: &Article) -> Result<(), StoreError> {
        let mut current = self.articles.lock().await;
        let mut next = current.clone();
        match next.iter_mut().find(|saved| saved.url == article.url) {
            Some(saved) => *saved = article.clone(),
            None => next.push(article.clone()),
        }
        self.commit(&mut current, next).await?;
        debug!("Saved article {}", article.url);
        Ok(())
    }

    async fn delete(&self, article: &Article) -> Result<(), StoreError> {
        let mut current = self.articles.lock().await;
        if !current.iter().any(|saved| saved.url == article.url) {
            debug!("Delete of unsaved article {} ignored", article.url);
            return Ok(());
        }
        let next = current
            .iter()
            .filter(|saved| saved.url != article.url)
            .cloned()
            .collect();
        self.commit(&mut current, next).await?;
        debug!("Deleted article {}", article.url);
        Ok(())
    }

    fn saved(&self) -> watch::Receiver<Vec<Article>> {
        self.tx.subscribe()
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
async fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)?;
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
