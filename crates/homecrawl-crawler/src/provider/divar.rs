//! HTTP adapter for the Divar mapview viewport endpoint.
//!
//! Builds the nested `search_data`/`camera_info` request the endpoint
//! expects, with filter fields included only when the caller constrained
//! them, and maps the response onto the three-way tile contract. Transient
//! failures (429, network errors) are retried with exponential backoff; the
//! excluded proxy layer is free to add its own retry budget on top.

use std::time::Duration;

use homecrawl_core::FilterCriteria;
use reqwest::Client;
use serde_json::json;

use super::retry::retry_with_backoff;
use super::types::ViewportResponse;
use super::{ProviderClient, TileScan};
use crate::error::ProviderError;
use crate::tiler::Tile;

const VIEWPORT_PATH: &str = "/v8/mapview/viewport";

/// Listing category the crawler targets.
const CATEGORY: &str = "apartment-sell";

/// Max zoom; tells the provider we want individual pins, not a city view.
const VIEWPORT_ZOOM: u32 = 99;

/// Client for the upstream mapview listings endpoint.
pub struct DivarClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl DivarClient {
    /// Creates a client with the configured timeout, `User-Agent`, and retry
    /// policy. `max_retries` is the number of additional attempts after the
    /// first failure; `0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds the viewport request body for one tile.
    ///
    /// Unconstrained filter dimensions are omitted entirely — the endpoint
    /// distinguishes "field absent" from "field false".
    fn viewport_payload(tile: &Tile, filters: &FilterCriteria) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        data.insert(
            "map_free_roaming".to_owned(),
            json!({ "boolean": { "value": true } }),
        );
        data.insert("category".to_owned(), json!({ "str": { "value": CATEGORY } }));

        if let Some(advertiser) = filters.advertiser {
            data.insert(
                "business-type".to_owned(),
                json!({ "str": { "value": advertiser.wire_value() } }),
            );
        }
        for (field, value) in [
            ("elevator", filters.elevator),
            ("parking", filters.parking),
            ("balcony", filters.balcony),
        ] {
            if let Some(value) = value {
                data.insert(field.to_owned(), json!({ "boolean": { "value": value } }));
            }
        }
        for (field, range) in [("size", filters.size), ("price", filters.price)] {
            if let Some((min, max)) = range {
                data.insert(
                    field.to_owned(),
                    json!({ "number_range": { "minimum": min, "maximum": max } }),
                );
            }
        }

        json!({
            "search_data": { "form_data": { "data": data } },
            "camera_info": {
                "bbox": {
                    "min_latitude": tile.min_lat,
                    "min_longitude": tile.min_lng,
                    "max_latitude": tile.max_lat,
                    "max_longitude": tile.max_lng,
                },
                "zoom": VIEWPORT_ZOOM,
            },
        })
    }

    async fn fetch_viewport(
        &self,
        tile: &Tile,
        filters: &FilterCriteria,
    ) -> Result<ViewportResponse, ProviderError> {
        let url = format!("{}{VIEWPORT_PATH}", self.base_url);
        let payload = Self::viewport_payload(tile, filters);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let payload = payload.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&payload)
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ProviderError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<ViewportResponse>(&body).map_err(|e| {
                    ProviderError::Deserialize {
                        context: format!("viewport response for tile {tile}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }
}

impl ProviderClient for DivarClient {
    async fn query_tile(
        &self,
        tile: &Tile,
        filters: &FilterCriteria,
    ) -> Result<TileScan, ProviderError> {
        let viewport = self.fetch_viewport(tile, filters).await?;

        // More than one cluster means the provider capped the result set for
        // this granularity; the post list (if any) is incomplete.
        if viewport.clusters.len() > 1 {
            return Ok(TileScan::Overflow {
                cluster_count: viewport.clusters.len(),
            });
        }

        tracing::debug!(tile = %tile, posts = viewport.posts.len(), "tile scan complete");
        Ok(TileScan::Posts(viewport.posts))
    }
}
