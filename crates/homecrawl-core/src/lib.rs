use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod filter;
pub mod listing;

pub use app_config::CrawlConfig;
pub use config::{load_crawl_config, load_crawl_config_from_env};
pub use filter::{AdvertiserType, FilterCriteria};
pub use listing::{CrawlResult, FeatureFlags, Listing, Location};

/// Configuration failures. Every `HOMECRAWL_*` variable has a default, so
/// the only way to fail is to set one to an unparseable value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
