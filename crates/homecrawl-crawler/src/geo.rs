//! Polygon input model and the small amount of planar geometry the tiler
//! needs.
//!
//! Coordinates are WGS-84 degrees throughout. The predicates here treat the
//! ring as a flat polygon; the spherical correction happens once in the tiler
//! when degree spans are converted to kilometers.

use serde::{Deserialize, Serialize};

use crate::error::CrawlError;

/// A single `(longitude, latitude)` vertex, GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// A search area: one exterior ring plus the caller's metadata.
///
/// The ring is implicitly closed — the last vertex does not need to repeat
/// the first. Holes and self-intersections are not modeled; a multi-polygon
/// input contributes its first outer ring only.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub ring: Vec<LngLat>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Polygon {
    #[must_use]
    pub fn new(ring: Vec<LngLat>) -> Self {
        Self {
            ring,
            id: None,
            name: None,
        }
    }

    /// The cache key for this area: `id`, else `name`, else `"unknown"`.
    #[must_use]
    pub fn area_id(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "unknown".to_owned())
    }

    /// Axis-aligned bounds as `(min_lng, min_lat, max_lng, max_lat)`.
    ///
    /// Returns `None` for an empty ring.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.ring.first()?;
        let mut bounds = (first.lng, first.lat, first.lng, first.lat);
        for p in &self.ring[1..] {
            bounds.0 = bounds.0.min(p.lng);
            bounds.1 = bounds.1.min(p.lat);
            bounds.2 = bounds.2.max(p.lng);
            bounds.3 = bounds.3.max(p.lat);
        }
        Some(bounds)
    }

    /// Even-odd ray cast. Points exactly on an edge may land on either side;
    /// the tiler compensates by also testing edge intersection.
    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        let ring = &self.ring;
        let n = ring.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if ((a.lat > point.lat) != (b.lat > point.lat))
                && point.lng < (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Extracts a [`Polygon`] from a GeoJSON-like value.
///
/// Accepts either a Feature (`properties` + `geometry`) or a bare geometry.
/// `Polygon` geometries contribute their exterior ring
/// (`coordinates[0]`); `MultiPolygon` geometries contribute the first
/// polygon's exterior ring (`coordinates[0][0]`). Every nested field is
/// presence-checked — nothing in the payload is assumed to exist.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidPolygon`] when the geometry is missing, has
/// an unsupported type, or carries no usable ring.
pub fn polygon_from_feature(value: &serde_json::Value) -> Result<Polygon, CrawlError> {
    let geometry = value.get("geometry").unwrap_or(value);

    let geom_type = geometry
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CrawlError::InvalidPolygon {
            reason: "geometry has no type".to_owned(),
        })?;

    let coordinates = geometry
        .get("coordinates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CrawlError::InvalidPolygon {
            reason: "geometry has no coordinates".to_owned(),
        })?;

    let ring_value = match geom_type {
        "Polygon" => coordinates.first(),
        "MultiPolygon" => coordinates
            .first()
            .and_then(|poly| poly.as_array())
            .and_then(|rings| rings.first()),
        other => {
            return Err(CrawlError::InvalidPolygon {
                reason: format!("unsupported geometry type {other}"),
            })
        }
    }
    .and_then(serde_json::Value::as_array)
    .ok_or_else(|| CrawlError::InvalidPolygon {
        reason: "geometry has an empty coordinate sequence".to_owned(),
    })?;

    let mut ring = Vec::with_capacity(ring_value.len());
    for pair in ring_value {
        let coords = pair.as_array().ok_or_else(|| CrawlError::InvalidPolygon {
            reason: "ring vertex is not a coordinate pair".to_owned(),
        })?;
        let (lng, lat) = match (
            coords.first().and_then(serde_json::Value::as_f64),
            coords.get(1).and_then(serde_json::Value::as_f64),
        ) {
            (Some(lng), Some(lat)) => (lng, lat),
            _ => {
                return Err(CrawlError::InvalidPolygon {
                    reason: "ring vertex is not numeric".to_owned(),
                })
            }
        };
        ring.push(LngLat { lng, lat });
    }

    // A closed GeoJSON ring repeats the first vertex; drop the duplicate so
    // vertex counts reflect distinct points.
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let properties = value.get("properties");
    let id = properties
        .and_then(|p| p.get("id"))
        .map(json_value_to_string);
    let name = properties
        .and_then(|p| p.get("name"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);

    Ok(Polygon { ring, id, name })
}

fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Proper or touching intersection of segments `a1-a2` and `b1-b2`.
pub(crate) fn segments_intersect(a1: LngLat, a2: LngLat, b1: LngLat, b2: LngLat) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Cross product of `(b - a) × (p - a)`.
fn cross(a: LngLat, b: LngLat, p: LngLat) -> f64 {
    (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng)
}

/// Whether collinear point `p` lies within the bounds of segment `a-b`.
fn on_segment(a: LngLat, b: LngLat, p: LngLat) -> bool {
    p.lng >= a.lng.min(b.lng)
        && p.lng <= a.lng.max(b.lng)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}
