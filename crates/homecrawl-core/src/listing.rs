//! Canonical listing records produced by the crawler.
//!
//! A [`Listing`] is the strict, normalized form of one upstream map post.
//! All of the upstream ambiguity (doubly-nested optional fields, localized
//! digit glyphs, icon-only chips) is resolved before one of these is built;
//! a post that cannot satisfy the invariants below is dropped, never emitted
//! with defaults.
//!
//! Invariants:
//! - `token` is unique within one [`CrawlResult`].
//! - `area_size` and `price_per_meter` are always present and finite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point, WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Amenity flags for a listing.
///
/// The upstream provider marks a *missing* amenity with an icon-only chip
/// (icon URL, no title) rendered crossed out; a listing with no such chip is
/// assumed to have the amenity. Hence all flags default to `true` — this
/// asymmetry is the provider's convention, not ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub has_elevator: bool,
    pub has_parking: bool,
    pub has_storage: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            has_elevator: true,
            has_parking: true,
            has_storage: true,
        }
    }
}

/// One normalized real-estate listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Provider-assigned unique identifier. Dedup key within a crawl.
    pub token: String,
    pub location: Location,
    /// Price per square meter, parsed from the structured price fields or the
    /// legacy subtitle. Always finite.
    pub price_per_meter: f64,
    /// Total asking price, when the provider exposes one. Never a drop
    /// reason; zero values are treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    /// Floor area in square meters, parsed from the area chip.
    pub area_size: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub subtitle1: String,
    #[serde(default)]
    pub subtitle2: String,
    #[serde(default)]
    pub subtitle3: String,
    #[serde(flatten)]
    pub features: FeatureFlags,
    /// Chip titles in provider order (size, rooms, age, ...). Icon-only
    /// chips carry no text and are not represented here.
    #[serde(default)]
    pub chips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// `"شخصی"` or `"آژانس املاک"` as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Construction year parsed from the age chip, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_age: Option<u32>,
    /// Raw floor chip text (e.g. "طبقه ۲ از ۵"), kept unparsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_count: Option<u32>,
    /// Full raw post, passed through for debugging and future extraction.
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// The merged, deduplicated outcome of crawling one area.
///
/// Created once per crawl invocation, written to the result cache, and never
/// mutated afterward; a later crawl of the same area supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Identifier of the crawled area (polygon id or name).
    pub area_id: String,
    /// Listings in first-seen order across tiles. Token-unique.
    pub listings: Vec<Listing>,
    pub completed_at: DateTime<Utc>,
}

impl CrawlResult {
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    /// Looks a listing up by its provider token.
    #[must_use]
    pub fn find(&self, token: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.token == token)
    }
}
