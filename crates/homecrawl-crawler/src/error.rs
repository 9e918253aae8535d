use thiserror::Error;

/// Transport-level failure for one tile query.
///
/// These are absorbed per tile by the orchestrator: a failing tile is
/// recorded as omitted coverage and the crawl continues. The excluded proxy
/// layer may additionally retry 429s upstream; the adapter retries them here
/// with backoff before giving up.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

/// Fatal crawl failures surfaced to the caller.
///
/// Everything else (overflowing tiles, transport errors on individual tiles,
/// cache write failures) is absorbed and reported in the crawl summary.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid polygon: {reason}")]
    InvalidPolygon { reason: String },

    #[error("crawl aborted: all {tiles} tiles failed")]
    Aborted { tiles: usize },
}

/// Failures of the backing cache store. Corrupt entries are not represented
/// here — the cache deletes them and reports a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}
