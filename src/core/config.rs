//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.headlines/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::news::sources::newsapi::{DEFAULT_NEWSAPI_BASE_URL, DEFAULT_PAGE_SIZE};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HeadlinesConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub newsapi: NewsApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_country: Option<String>,
    pub page_size: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub check_connectivity: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NewsApiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub saved_articles_path: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const SAVED_ARTICLES_FILE: &str = "saved_articles.json";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_country: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub check_connectivity: bool,
    pub newsapi_key: Option<String>,
    pub newsapi_base_url: String,
    pub saved_articles_path: PathBuf,
}

/// Values given on the command line. None = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub country: Option<String>,
    pub check_connectivity: Option<bool>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.headlines`, the home of the config file and bookmarks.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".headlines"))
}

/// Returns the path to `~/.headlines/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.headlines/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `HeadlinesConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<HeadlinesConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(HeadlinesConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(HeadlinesConfig::default());
    }

    load_config_from(&path)
}

/// Parse a config file at an explicit path.
pub fn load_config_from(path: &Path) -> Result<HeadlinesConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: HeadlinesConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    // Never log the API key
    debug!(
        "Config: general={:?}, newsapi.base_url={:?}, storage={:?}",
        config.general, config.newsapi.base_url, config.storage
    );
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Headlines Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_country = "us"             # Or set HEADLINES_COUNTRY env var
# page_size = 20
# request_timeout_secs = 30
# check_connectivity = true          # Set false on hosts without /sys/class/net

# [newsapi]
# api_key = "..."                    # Or set NEWS_API_KEY env var
# base_url = "https://newsapi.org"   # Or set NEWS_API_BASE_URL env var

# [storage]
# saved_articles_path = "/home/me/.headlines/saved_articles.json"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &HeadlinesConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Country: CLI → env → config → default
    let default_country = cli
        .country
        .clone()
        .or_else(|| std::env::var("HEADLINES_COUNTRY").ok())
        .or_else(|| config.general.default_country.clone())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    // Connectivity check: CLI → config → default
    let check_connectivity = cli
        .check_connectivity
        .or(config.general.check_connectivity)
        .unwrap_or(true);

    // API key: env → config
    let newsapi_key = std::env::var("NEWS_API_KEY")
        .ok()
        .or_else(|| config.newsapi.api_key.clone());

    // Base URL: env → config → default
    let newsapi_base_url = std::env::var("NEWS_API_BASE_URL")
        .ok()
        .or_else(|| config.newsapi.base_url.clone())
        .unwrap_or_else(|| DEFAULT_NEWSAPI_BASE_URL.to_string());

    let saved_articles_path = config
        .storage
        .saved_articles_path
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| data_dir().map(|d| d.join(SAVED_ARTICLES_FILE)))
        .unwrap_or_else(|| PathBuf::from(SAVED_ARTICLES_FILE));

    ResolvedConfig {
        default_country,
        page_size: config
            .general
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE),
        request_timeout: Duration::from_secs(
            config
                .general
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        check_connectivity,
        newsapi_key,
        newsapi_base_url,
        saved_articles_path,
    }
}
