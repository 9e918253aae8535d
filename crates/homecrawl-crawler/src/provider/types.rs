//! Raw response types for the upstream mapview viewport endpoint.
//!
//! ## Observed shape from live responses
//!
//! ### Posts vs clusters
//! A viewport query returns `posts` (individual pins) when the area is
//! sparse enough to enumerate, and `clusters` (aggregated counts) when it is
//! not. Responses for dense areas carry more than one cluster and an empty
//! or truncated post list — that is the provider's silent result cap, and
//! the crawler treats it as tile overflow rather than as data.
//!
//! ### Double-nested `properties`
//! A pin feature's payload sits at `map_pin_feature.properties.properties`.
//! The outer `properties` object exists for GeoJSON compatibility and holds
//! nothing else we use. Both levels may be absent.
//!
//! ### Card vs pin duplication
//! Newer payloads put token/title/chips/price data on `map_post_card`;
//! older ones only fill the nested pin properties. Either side (or both) may
//! be present, so every extraction falls back from card to pin.
//!
//! ### Chips
//! Chips are short metadata labels. Text chips carry `title` (`"۸۰ متر"`,
//! `"۲ خواب"`). Amenity chips for a *missing* amenity carry only
//! `icon_url_light`/`icon_url_dark` (the UI renders them crossed out) and no
//! title. A present amenity produces no chip at all.
//!
//! ### Price fields
//! `price_fields` entries pair a label with a localized value, e.g.
//! `{"title": "متری:", "value": "۱۲۵٬۰۰۰٬۰۰۰ تومان"}` for the per-meter
//! price and `{"title": "قیمت:", ...}` for the total. Legacy payloads carry
//! the same numbers pre-rendered in `subtitle1`/`subtitle2` instead.

use serde::{Deserialize, Serialize};

/// Top-level response from `POST /v8/mapview/viewport`.
#[derive(Debug, Deserialize)]
pub struct ViewportResponse {
    #[serde(default)]
    pub posts: Vec<RawPost>,
    /// Opaque cluster blobs; only the count matters for overflow detection.
    #[serde(default)]
    pub clusters: Vec<serde_json::Value>,
}

/// One raw map post. Ephemeral in the pipeline, but serializable so a
/// normalized listing can carry the untouched payload for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub map_post_card: Option<MapPostCard>,
    #[serde(default)]
    pub map_pin_feature: Option<MapPinFeature>,
}

/// Card payload attached to newer posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapPostCard {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chips: Vec<Chip>,
    #[serde(default)]
    pub price_fields: Vec<PriceField>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Map pin with coordinates and the doubly-nested legacy properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapPinFeature {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub properties: Option<PinProperties>,
}

/// Outer GeoJSON-compatibility wrapper; see the module docs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinProperties {
    #[serde(default)]
    pub properties: Option<PinDetails>,
}

/// Legacy pin payload. Everything is optional in the wild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinDetails {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub subtitle1: Option<String>,
    #[serde(default)]
    pub subtitle2: Option<String>,
    #[serde(default)]
    pub subtitle3: Option<String>,
    #[serde(default)]
    pub chips: Vec<Chip>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Advertiser kind as display text (`"شخصی"` / `"آژانس املاک"`).
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A chip: text label, icon-only marker, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chip {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon_url_light: Option<String>,
    #[serde(default)]
    pub icon_url_dark: Option<String>,
}

impl Chip {
    /// A chip with no human-readable title; see the module docs for why this
    /// signals an *absent* amenity.
    #[must_use]
    pub fn is_icon_only(&self) -> bool {
        self.title.as_deref().is_none_or(str::is_empty)
            && (self.icon_url_light.is_some() || self.icon_url_dark.is_some())
    }
}

/// A labeled price entry from the card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceField {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}
