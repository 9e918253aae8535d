//! Polygon-to-tile decomposition.
//!
//! Lays a uniform square grid over a polygon's bounding box and keeps the
//! cells that geometrically intersect the polygon. Longitude steps shrink by
//! `cos(mean latitude)` so cells stay ~square on the ground. Cell sizing
//! adapts to the polygon so that small areas still produce a usable grid and
//! large target sizes collapse to a single bounding-box query.

use std::f64::consts::PI;

use crate::error::CrawlError;
use crate::geo::{segments_intersect, LngLat, Polygon};

const KM_PER_LAT_DEGREE: f64 = 111.32;

/// Lower bound on the adaptive cell side. 100 m.
const MIN_CELL_SIDE_KM: f64 = 0.1;

/// One axis-aligned rectangular query unit.
///
/// Invariant: `min_lat < max_lat` and `min_lng < max_lng` for every tile the
/// tiler emits (degenerate input polygons may yield a degenerate fallback
/// tile, which the provider treats as a point query).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Tile {
    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    fn corners(&self) -> [LngLat; 4] {
        [
            LngLat {
                lng: self.min_lng,
                lat: self.min_lat,
            },
            LngLat {
                lng: self.min_lng,
                lat: self.max_lat,
            },
            LngLat {
                lng: self.max_lng,
                lat: self.max_lat,
            },
            LngLat {
                lng: self.max_lng,
                lat: self.min_lat,
            },
        ]
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.5},{:.5}]x[{:.5},{:.5}]",
            self.min_lat, self.max_lat, self.min_lng, self.max_lng
        )
    }
}

/// Decomposes `polygon` into an ordered, covering set of tiles.
///
/// - When the whole bounding box fits inside one target cell, the box itself
///   is the only tile.
/// - When the shorter box dimension is below the target, the cell side
///   shrinks to half that dimension (floored at 100 m) so at least two rows
///   or columns span the narrow axis.
/// - Cells are emitted row-major from the south-west corner; only cells that
///   geometrically intersect the polygon are kept. The last row and column
///   may overshoot the box so the polygon is always fully covered.
/// - If no cell intersects (degenerate ring), the bounding box is returned as
///   a single tile.
///
/// Pure function of its inputs; the output order is deterministic.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidPolygon`] when the ring has fewer than three
/// vertices.
pub fn decompose(polygon: &Polygon, target_cell_side_km: f64) -> Result<Vec<Tile>, CrawlError> {
    if polygon.ring.len() < 3 {
        return Err(CrawlError::InvalidPolygon {
            reason: format!(
                "polygon must have at least 3 coordinates, got {}",
                polygon.ring.len()
            ),
        });
    }

    let (min_lng, min_lat, max_lng, max_lat) =
        polygon
            .bounding_box()
            .ok_or_else(|| CrawlError::InvalidPolygon {
                reason: "polygon has an empty coordinate sequence".to_owned(),
            })?;

    let bbox_tile = Tile {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    };

    let mean_lat = f64::midpoint(min_lat, max_lat);
    let lat_cos = (mean_lat * PI / 180.0).cos();
    let height_km = (max_lat - min_lat) * KM_PER_LAT_DEGREE;
    let width_km = (max_lng - min_lng) * KM_PER_LAT_DEGREE * lat_cos;

    // One cell already covers the whole box: a finer grid would only multiply
    // identical queries.
    if height_km <= target_cell_side_km && width_km <= target_cell_side_km {
        return Ok(vec![bbox_tile]);
    }

    let min_dim_km = height_km.min(width_km);
    let cell_side_km = if min_dim_km < target_cell_side_km {
        (min_dim_km / 2.0).max(MIN_CELL_SIDE_KM)
    } else {
        target_cell_side_km
    };

    let lat_step = cell_side_km / KM_PER_LAT_DEGREE;
    let lng_step = cell_side_km / (KM_PER_LAT_DEGREE * lat_cos);

    let mut tiles = Vec::new();
    let mut lat = min_lat;
    while lat < max_lat {
        let mut lng = min_lng;
        while lng < max_lng {
            let tile = Tile {
                min_lat: lat,
                max_lat: lat + lat_step,
                min_lng: lng,
                max_lng: lng + lng_step,
            };
            if tile_intersects_polygon(&tile, polygon) {
                tiles.push(tile);
            }
            lng += lng_step;
        }
        lat += lat_step;
    }

    // Degenerate ring: nothing intersected, query the box directly.
    if tiles.is_empty() {
        tiles.push(bbox_tile);
    }

    Ok(tiles)
}

/// True geometric intersection, not merely bounding-box overlap: the tile
/// touches the polygon if a tile corner lies inside the ring, a ring vertex
/// lies inside the tile, or any tile edge crosses any ring edge.
fn tile_intersects_polygon(tile: &Tile, polygon: &Polygon) -> bool {
    if tile.corners().iter().any(|&c| polygon.contains(c)) {
        return true;
    }
    if polygon.ring.iter().any(|&v| tile.contains(v)) {
        return true;
    }

    let corners = tile.corners();
    let n = polygon.ring.len();
    for i in 0..4 {
        let (e1, e2) = (corners[i], corners[(i + 1) % 4]);
        for j in 0..n {
            let (p1, p2) = (polygon.ring[j], polygon.ring[(j + 1) % n]);
            if segments_intersect(e1, e2, p1, p2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lng: f64, min_lat: f64, side_deg: f64) -> Polygon {
        Polygon::new(vec![
            LngLat {
                lng: min_lng,
                lat: min_lat,
            },
            LngLat {
                lng: min_lng,
                lat: min_lat + side_deg,
            },
            LngLat {
                lng: min_lng + side_deg,
                lat: min_lat + side_deg,
            },
            LngLat {
                lng: min_lng + side_deg,
                lat: min_lat,
            },
        ])
    }

    #[test]
    fn rejects_ring_with_two_points() {
        let polygon = Polygon::new(vec![
            LngLat { lng: 0.0, lat: 0.0 },
            LngLat { lng: 1.0, lat: 1.0 },
        ]);
        let result = decompose(&polygon, 1.0);
        assert!(matches!(result, Err(CrawlError::InvalidPolygon { .. })));
    }

    #[test]
    fn unit_square_with_oversized_cell_is_one_bbox_tile() {
        // 1 degree ≈ 111 km; a 200 km cell swallows the whole box.
        let polygon = square(0.0, 0.0, 1.0);
        let tiles = decompose(&polygon, 200.0).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(
            tiles[0],
            Tile {
                min_lat: 0.0,
                max_lat: 1.0,
                min_lng: 0.0,
                max_lng: 1.0
            }
        );
    }

    #[test]
    fn tiny_polygon_is_one_bbox_tile() {
        // ~50 m square, well under the 100 m cell floor.
        let polygon = square(51.4, 35.7, 0.00045);
        let tiles = decompose(&polygon, 1.0).unwrap();
        assert_eq!(tiles.len(), 1);
        assert!((tiles[0].min_lng - 51.4).abs() < 1e-9);
        assert!((tiles[0].max_lat - 35.700_45).abs() < 1e-9);
    }

    #[test]
    fn city_block_polygon_produces_grid() {
        // ~5.5 km square at lat 35, 1 km cells: expect a 6x6-ish grid.
        let polygon = square(51.0, 35.0, 0.05);
        let tiles = decompose(&polygon, 1.0).unwrap();
        assert!(
            tiles.len() >= 25 && tiles.len() <= 64,
            "got {}",
            tiles.len()
        );
    }

    #[test]
    fn tiles_cover_every_interior_sample_point() {
        let polygon = Polygon::new(vec![
            LngLat { lng: 51.0, lat: 35.0 },
            LngLat { lng: 51.0, lat: 35.04 },
            LngLat {
                lng: 51.05,
                lat: 35.02,
            },
            LngLat { lng: 51.03, lat: 35.0 },
        ]);
        let tiles = decompose(&polygon, 1.0).unwrap();
        assert!(!tiles.is_empty());

        let mut samples = 0;
        for i in 1..20 {
            for j in 1..20 {
                let point = LngLat {
                    lng: 51.0 + f64::from(i) * 0.0025,
                    lat: 35.0 + f64::from(j) * 0.002,
                };
                if polygon.contains(point) {
                    samples += 1;
                    assert!(
                        tiles.iter().any(|t| t.contains(point)),
                        "interior point {point:?} not covered by any tile"
                    );
                }
            }
        }
        assert!(samples > 10, "sampling grid missed the polygon interior");
    }

    #[test]
    fn narrow_polygon_shrinks_cell_side() {
        // ~0.5 km tall, ~10 km wide at the equator with 1 km target cells:
        // the cell side must shrink to ~0.25 km so two rows span the height.
        let polygon = Polygon::new(vec![
            LngLat { lng: 0.0, lat: 0.0 },
            LngLat {
                lng: 0.0,
                lat: 0.0045,
            },
            LngLat {
                lng: 0.09,
                lat: 0.0045,
            },
            LngLat { lng: 0.09, lat: 0.0 },
        ]);
        let tiles = decompose(&polygon, 1.0).unwrap();
        let rows = tiles
            .iter()
            .map(|t| format!("{:.6}", t.min_lat))
            .collect::<std::collections::HashSet<_>>()
            .len();
        assert!(rows >= 2, "expected at least 2 rows, got {rows}");
    }

    #[test]
    fn triangle_excludes_far_corner_cells() {
        let polygon = Polygon::new(vec![
            LngLat { lng: 51.0, lat: 35.0 },
            LngLat { lng: 51.05, lat: 35.0 },
            LngLat {
                lng: 51.0,
                lat: 35.05,
            },
        ]);
        let tiles = decompose(&polygon, 1.0).unwrap();
        let ne_corner = LngLat {
            lng: 51.049,
            lat: 35.049,
        };
        assert!(!polygon.contains(ne_corner));
        // The grid over the bbox would have ~36 cells; the triangle keeps
        // only about half plus the diagonal fringe.
        assert!(
            !tiles.iter().any(|t| t.min_lng >= 51.045 && t.min_lat >= 35.045),
            "cell at the empty bbox corner should have been filtered out"
        );
    }

    #[test]
    fn decompose_is_deterministic() {
        let polygon = square(51.0, 35.0, 0.03);
        let first = decompose(&polygon, 1.0).unwrap();
        let second = decompose(&polygon, 1.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn all_emitted_tiles_are_well_formed() {
        let polygon = square(51.0, 35.0, 0.05);
        for tile in decompose(&polygon, 1.0).unwrap() {
            assert!(tile.min_lat < tile.max_lat);
            assert!(tile.min_lng < tile.max_lng);
        }
    }
}
