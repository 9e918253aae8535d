use std::path::PathBuf;

/// Runtime configuration for the crawler and CLI.
///
/// Every field has a sensible default so the binary runs with an empty
/// environment; see [`crate::config::load_crawl_config`] for the `HOMECRAWL_*`
/// variables that override them.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Base URL of the upstream listings API.
    pub provider_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff: `base * 2^attempt`.
    pub retry_backoff_base_secs: u64,
    /// Target grid cell side in kilometers for polygon decomposition.
    pub tile_side_km: f64,
    /// Result cache freshness window.
    pub cache_ttl_hours: u32,
    /// Directory for the file-backed result cache.
    pub cache_dir: PathBuf,
    pub log_level: String,
}
