//! Upstream provider boundary.
//!
//! The orchestrator only sees the three-way [`TileScan`]/[`ProviderError`]
//! contract; the concrete HTTP adapter lives in [`divar`] and any transport
//! (test double, proxy-backed client) can stand in behind [`ProviderClient`].

pub mod divar;
mod retry;
pub mod types;

pub use divar::DivarClient;
pub use types::{Chip, MapPinFeature, MapPostCard, PinDetails, PriceField, RawPost};

use homecrawl_core::FilterCriteria;

use crate::error::ProviderError;
use crate::tiler::Tile;

/// Outcome of querying one tile, minus transport failures (those are the
/// `Err` arm of [`ProviderClient::query_tile`]).
#[derive(Debug)]
pub enum TileScan {
    /// The tile was sparse enough to enumerate individually.
    Posts(Vec<RawPost>),
    /// Too dense: the provider collapsed results into clusters and withheld
    /// the individual pins.
    Overflow { cluster_count: usize },
}

/// One query per tile against the upstream listings endpoint.
#[allow(async_fn_in_trait)]
pub trait ProviderClient {
    /// Queries a single tile with the crawl's filter criteria.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport-level failure; density overflow
    /// is a successful response ([`TileScan::Overflow`]), not an error.
    async fn query_tile(
        &self,
        tile: &Tile,
        filters: &FilterCriteria,
    ) -> Result<TileScan, ProviderError>;
}
