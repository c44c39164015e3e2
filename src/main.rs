use std::error::Error;
use std::fs::File;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use headlines::core::bookmarks::JsonArticleStore;
use headlines::core::config::{self, CliOverrides};
use headlines::core::connectivity::{AlwaysOnline, ConnectivityChecker, SysfsConnectivity};
use headlines::core::{FeedStatus, Newsroom, Status};
use headlines::news::{Article, NewsApiSource};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "headlines", about = "Paginated news in the terminal")]
struct Args {
    /// Check local network interfaces before each request (overrides config)
    #[arg(long)]
    offline_check: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Top headlines for a country
    Breaking {
        /// ISO 3166 country code
        #[arg(short, long)]
        country: Option<String>,
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Search every article
    Search {
        query: String,
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
        /// Bookmark every result
        #[arg(long)]
        save: bool,
    },
    /// List bookmarked articles
    Saved,
    /// Remove a bookmark by URL
    Unsave { url: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to headlines.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("headlines.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let cli = CliOverrides {
        country: match &args.command {
            Command::Breaking { country, .. } => country.clone(),
            _ => None,
        },
        check_connectivity: args.offline_check,
    };
    let resolved = config::resolve(&config::load_config()?, &cli);
    log::info!(
        "Headlines starting: country={}, page_size={}, check_connectivity={}",
        resolved.default_country,
        resolved.page_size,
        resolved.check_connectivity
    );

    let source = Arc::new(NewsApiSource::with_options(
        resolved.newsapi_key.clone(),
        Some(resolved.newsapi_base_url.clone()),
        resolved.page_size,
        resolved.request_timeout,
    ));
    let store = Arc::new(JsonArticleStore::open(&resolved.saved_articles_path)?);
    let connectivity: Arc<dyn ConnectivityChecker> = if resolved.check_connectivity {
        Arc::new(SysfsConnectivity::new())
    } else {
        Arc::new(AlwaysOnline)
    };
    let newsroom = Newsroom::new(source, store, connectivity);

    match args.command {
        Command::Breaking { pages, .. } => {
            let rx = newsroom.breaking_news_status();
            for _ in 0..pages.max(1) {
                newsroom
                    .fetch_breaking_news(&resolved.default_country)
                    .await?;
                if should_stop(&rx)? || newsroom.is_last_breaking_page(resolved.page_size).await {
                    break;
                }
            }
            print_feed(&rx);
        }
        Command::Search { query, pages, save } => {
            let rx = newsroom.search_news_status();
            for _ in 0..pages.max(1) {
                newsroom.search_news(&query).await?;
                if should_stop(&rx)? || newsroom.is_last_search_page(resolved.page_size).await {
                    break;
                }
            }
            print_feed(&rx);

            if save {
                let found = rx
                    .borrow()
                    .as_ref()
                    .and_then(|status| status.data())
                    .map(|page| page.articles.clone())
                    .unwrap_or_default();
                for article in found {
                    newsroom.save_article(article).await?;
                }
                println!("Saved {} articles", newsroom.saved_articles().borrow().len());
            }
        }
        Command::Saved => {
            let saved = newsroom.saved_articles().borrow().clone();
            if saved.is_empty() {
                println!("No saved articles");
            }
            for (i, article) in saved.iter().enumerate() {
                print_article(i + 1, article);
            }
        }
        Command::Unsave { url } => {
            let target = newsroom
                .saved_articles()
                .borrow()
                .iter()
                .find(|article| article.url == url)
                .cloned();
            match target {
                Some(article) => {
                    newsroom.delete_article(article).await?;
                    println!("Removed {url}");
                }
                None => println!("No saved article with URL {url}"),
            }
        }
    }

    newsroom.shutdown();
    Ok(())
}

/// Returns `Ok(true)` when the feed has nothing more to give and the error
/// when the last fetch failed.
fn should_stop(rx: &watch::Receiver<FeedStatus>) -> Result<bool, Box<dyn Error>> {
    match &*rx.borrow() {
        Some(Status::Success(page)) => Ok(page.is_empty()),
        Some(Status::Error(e)) => Err(e.clone().into()),
        Some(Status::Loading) | None => Ok(true),
    }
}

fn print_feed(rx: &watch::Receiver<FeedStatus>) {
    if let Some(Status::Success(page)) = &*rx.borrow() {
        println!("{} of {} results", page.len(), page.total_results);
        for (i, article) in page.articles.iter().enumerate() {
            print_article(i + 1, article);
        }
    }
}

fn print_article(n: usize, article: &Article) {
    println!("{n:>3}. {}", article.title);
    let published = article
        .published_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "undated".to_string());
    println!("     {} · {}", article.source.name, published);
    println!("     {}", article.url);
}
