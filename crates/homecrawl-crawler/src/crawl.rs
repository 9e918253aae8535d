//! Crawl orchestration: polygon in, deduplicated listing set out.
//!
//! One crawl decomposes the polygon into tiles, queries the provider tile by
//! tile, normalizes and merges the results, and writes the outcome to the
//! result cache. Tiles are independent: an overflowing or failing tile is
//! recorded in the report and the crawl moves on. Only a crawl in which
//! *every* tile fails at the transport level aborts — an overflow-only crawl
//! still completes with an empty (and honest) result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use homecrawl_core::{CrawlResult, FilterCriteria, Listing};
use std::collections::HashSet;

use crate::cache::{KvStore, ResultCache};
use crate::error::CrawlError;
use crate::geo::Polygon;
use crate::normalize::normalize_post;
use crate::provider::{ProviderClient, TileScan};
use crate::tiler;

/// Cooperative cancellation handle. Clone it, hand one side to a signal
/// handler, and the crawl stops after the in-flight tile completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-invocation knobs.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Skip the cache read and crawl fresh. The result is still written back.
    pub force_refresh: bool,
    pub cancel: CancelFlag,
}

/// Progress snapshot delivered after each tile.
#[derive(Debug)]
pub struct CrawlProgress<'a> {
    /// Fraction of tiles processed, in `0.0..=1.0`. Monotone within a crawl.
    pub fraction: f64,
    pub status: String,
    /// Listings merged so far, first-seen order.
    pub listings: &'a [Listing],
}

/// Tile-level accounting for one crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub tiles_total: usize,
    pub tiles_succeeded: usize,
    /// Tiles the provider refused to enumerate (too dense). Their listings
    /// are missing from the result.
    pub tiles_overflowed: usize,
    /// Tiles that failed at the transport level after retries.
    pub tiles_failed: usize,
    /// The result came straight from the cache; no tiles were queried.
    pub from_cache: bool,
    /// The crawl was cancelled; the result covers only the tiles processed
    /// before the flag was observed.
    pub cancelled: bool,
}

/// A completed (possibly partial) crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub result: CrawlResult,
    pub report: CrawlReport,
}

/// The crawl orchestrator. Generic over the provider transport and the cache
/// store so tests can script both.
pub struct Crawler<P, S> {
    provider: P,
    cache: ResultCache<S>,
    tile_side_km: f64,
}

impl<P: ProviderClient, S: KvStore> Crawler<P, S> {
    pub fn new(provider: P, cache: ResultCache<S>, tile_side_km: f64) -> Self {
        Self {
            provider,
            cache,
            tile_side_km,
        }
    }

    /// Crawls `polygon` with `filters`, reporting progress after every tile.
    ///
    /// Returns the merged result and its report. A cached result (unless
    /// `force_refresh`) short-circuits the whole pipeline.
    ///
    /// # Errors
    ///
    /// [`CrawlError::InvalidPolygon`] if the polygon cannot be tiled, and
    /// [`CrawlError::Aborted`] when every tile fails at the transport level.
    pub async fn crawl(
        &self,
        polygon: &Polygon,
        filters: &FilterCriteria,
        options: &CrawlOptions,
        mut on_progress: impl FnMut(CrawlProgress<'_>),
    ) -> Result<CrawlOutcome, CrawlError> {
        let area_id = polygon.area_id();

        if !options.force_refresh {
            match self.cache.get(&area_id).await {
                Ok(Some(result)) => {
                    tracing::info!(area_id, listings = result.listing_count(), "cache hit");
                    on_progress(CrawlProgress {
                        fraction: 1.0,
                        status: "loaded from cache".to_owned(),
                        listings: &result.listings,
                    });
                    return Ok(CrawlOutcome {
                        result,
                        report: CrawlReport {
                            from_cache: true,
                            ..CrawlReport::default()
                        },
                    });
                }
                Ok(None) => {}
                // A broken cache never blocks a crawl.
                Err(e) => tracing::warn!(area_id, error = %e, "cache read failed, crawling fresh"),
            }
        }

        let tiles = tiler::decompose(polygon, self.tile_side_km)?;
        let mut report = CrawlReport {
            tiles_total: tiles.len(),
            ..CrawlReport::default()
        };
        tracing::info!(area_id, tiles = tiles.len(), "starting crawl");

        let mut listings: Vec<Listing> = Vec::new();
        let mut seen_tokens: HashSet<String> = HashSet::new();

        for (index, tile) in tiles.iter().enumerate() {
            if options.cancel.is_cancelled() {
                tracing::info!(area_id, processed = index, "crawl cancelled");
                report.cancelled = true;
                break;
            }

            match self.provider.query_tile(tile, filters).await {
                Ok(TileScan::Posts(posts)) => {
                    report.tiles_succeeded += 1;
                    let before = listings.len();
                    for post in &posts {
                        let Some(listing) = normalize_post(post) else {
                            continue;
                        };
                        // First-seen wins; tiles overlap at their edges.
                        if seen_tokens.insert(listing.token.clone()) {
                            listings.push(listing);
                        }
                    }
                    tracing::debug!(
                        tile = %tile,
                        posts = posts.len(),
                        added = listings.len() - before,
                        "tile merged"
                    );
                }
                Ok(TileScan::Overflow { cluster_count }) => {
                    report.tiles_overflowed += 1;
                    tracing::warn!(tile = %tile, cluster_count, "tile overflowed, listings withheld");
                }
                Err(e) => {
                    report.tiles_failed += 1;
                    tracing::warn!(tile = %tile, error = %e, "tile query failed");
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let fraction = (index + 1) as f64 / tiles.len() as f64;
            on_progress(CrawlProgress {
                fraction,
                status: format!(
                    "tile {}/{} — {} listings",
                    index + 1,
                    tiles.len(),
                    listings.len()
                ),
                listings: &listings,
            });
        }

        if !report.cancelled && report.tiles_failed == report.tiles_total {
            return Err(CrawlError::Aborted {
                tiles: report.tiles_total,
            });
        }

        let result = CrawlResult {
            area_id: area_id.clone(),
            listings,
            completed_at: Utc::now(),
        };

        // A partial (cancelled) result must not shadow a full crawl for the
        // whole TTL, so it is returned but never cached.
        if report.cancelled {
            tracing::info!(area_id, listings = result.listing_count(), "partial result, not cached");
        } else if let Err(e) = self.cache.put(&result).await {
            tracing::warn!(area_id, error = %e, "failed to cache crawl result");
        }

        tracing::info!(
            area_id,
            listings = result.listing_count(),
            succeeded = report.tiles_succeeded,
            overflowed = report.tiles_overflowed,
            failed = report.tiles_failed,
            "crawl complete"
        );
        Ok(CrawlOutcome { result, report })
    }
}
