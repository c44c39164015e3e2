//! # Feed Accumulation
//!
//! Pure pagination state for one feed. No I/O: the newsroom decides which
//! page to request from here, awaits the source, then hands the result back.
//!
//! ```text
//! Feed
//! ├── page: u32                    // next page to request, starts at 1
//! ├── accumulated: Option<NewsPage> // every article received so far
//! └── last_query: Option<String>   // search only: topic of `accumulated`
//! ```

use crate::news::NewsPage;

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    page: u32,
    accumulated: Option<NewsPage>,
    last_query: Option<String>,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        Self {
            page: 1,
            accumulated: None,
            last_query: None,
        }
    }

    /// The page the next fetch will request.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn accumulated(&self) -> Option<&NewsPage> {
        self.accumulated.as_ref()
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// The page a search for `query` should request. A new topic starts over
    /// at page 1; the same topic continues where it left off.
    pub fn page_for_query(&self, query: &str) -> u32 {
        if self.last_query.as_deref() == Some(query) {
            self.page
        } else {
            1
        }
    }

    /// Appends a successful page and advances the page counter.
    ///
    /// The first page becomes the accumulated buffer; later pages extend it in
    /// arrival order. `total_results` tracks the latest server-reported value.
    pub fn append(&mut self, page: NewsPage) -> &NewsPage {
        self.page += 1;
        let acc = self.accumulated.get_or_insert_with(NewsPage::default);
        acc.total_results = page.total_results;
        acc.articles.extend(page.articles);
        acc
    }

    /// Merges a successful search page. A query different from the one the
    /// buffer was built for discards the buffer first.
    pub fn merge_search(&mut self, query: &str, page: NewsPage) -> &NewsPage {
        if self.last_query.as_deref() != Some(query) {
            self.accumulated = None;
            self.page = 1;
            self.last_query = Some(query.to_string());
        }
        self.append(page)
    }

    /// True once every page the server reported has been fetched.
    pub fn is_last_page(&self, page_size: u32) -> bool {
        match &self.accumulated {
            Some(acc) => {
                let total_pages = acc.total_results.div_ceil(page_size.max(1));
                self.page > total_pages
            }
            None => false,
        }
    }
}
