pub mod cache;
pub mod crawl;
pub mod error;
pub mod geo;
mod normalize;
mod parse;
pub mod provider;
pub mod tiler;

pub use cache::{FileStore, KvStore, MemoryStore, ResultCache};
pub use crawl::{CancelFlag, CrawlOptions, CrawlOutcome, CrawlProgress, CrawlReport, Crawler};
pub use error::{CacheError, CrawlError, ProviderError};
pub use geo::{polygon_from_feature, LngLat, Polygon};
pub use normalize::normalize_post;
pub use provider::{DivarClient, ProviderClient, RawPost, TileScan};
pub use tiler::{decompose, Tile};
