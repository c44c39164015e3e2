pub mod source;
pub mod sources;
pub mod types;

pub use source::{NewsSource, SourceError};
pub use sources::NewsApiSource;
pub use types::{Article, ArticleSource, NewsPage};
