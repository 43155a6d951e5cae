#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Polygon utilities for commune zoning.
//!
//! Raw geometry rows arrive as stringified GeoJSON from the store. They
//! are parsed and validated here, at the boundary, into `geo` types —
//! nothing downstream ever touches a raw geometry string. All operations
//! work in WGS84 degrees.

use geo::{
    BooleanOps, BoundingRect, ConcaveHull, Contains, ConvexHull, Coord, MultiPoint, MultiPolygon,
    Point, Polygon, Rect, Scale,
};
use geojson::GeoJson;
use thiserror::Error;

/// Errors raised at the geometry boundary.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The GeoJSON string was malformed or held an unsupported type.
    #[error("Invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of what went wrong.
        message: String,
    },
}

impl GeometryError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }
}

/// Parses a GeoJSON string into a [`MultiPolygon`].
///
/// Accepts `Polygon` and `MultiPolygon` geometries, either bare or
/// wrapped in a `Feature` (zone geometries produced by clipping are
/// serialized as features).
///
/// # Errors
///
/// Returns [`GeometryError::InvalidGeometry`] if the string does not
/// parse or holds a non-areal geometry type.
pub fn parse_geometry(geojson_str: &str) -> Result<MultiPolygon<f64>, GeometryError> {
    let geojson: GeoJson = geojson_str
        .parse()
        .map_err(|e| GeometryError::invalid(format!("GeoJSON parse failed: {e}")))?;

    let geometry = match geojson {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => f
            .geometry
            .ok_or_else(|| GeometryError::invalid("Feature without geometry"))?,
        GeoJson::FeatureCollection(_) => {
            return Err(GeometryError::invalid(
                "Expected a geometry, got a FeatureCollection",
            ));
        }
    };

    let geo_geom: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e| GeometryError::invalid(format!("Geometry conversion failed: {e}")))?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(GeometryError::invalid(format!(
            "Unsupported geometry type: {other:?}"
        ))),
    }
}

/// Serializes a [`MultiPolygon`] back to a GeoJSON geometry string.
///
/// A single-polygon multi collapses to a plain `Polygon`, matching what
/// the map layer expects for simple zones.
#[must_use]
pub fn to_geojson_string(mp: &MultiPolygon<f64>) -> String {
    let value = if mp.0.len() == 1 {
        geojson::Value::from(&mp.0[0])
    } else {
        geojson::Value::from(mp)
    };
    geojson::Geometry::new(value).to_string()
}

/// Approximate center of a geometry for map framing.
///
/// Arithmetic mean of the outer-ring vertices of the first polygon —
/// deliberately not an area-weighted centroid; the map only needs a
/// plausible point to frame the viewport on.
#[must_use]
pub fn centroid_of(mp: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let exterior = mp.0.first()?.exterior();
    let coords = ring_vertices(exterior.0.as_slice());
    if coords.is_empty() {
        return None;
    }
    let n = f64::from(u32::try_from(coords.len()).ok()?);
    let (sum_x, sum_y) = coords
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    Some(Point::new(sum_x / n, sum_y / n))
}

/// Bounding box over all rings of all polygons.
#[must_use]
pub fn bounding_box_of(mp: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    mp.bounding_rect()
}

/// One cell of a zoning grid, clipped to the source geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// Row index (0 = south).
    pub row: usize,
    /// Column index (0 = west).
    pub col: usize,
    /// Cell geometry, intersected with the source.
    pub geometry: MultiPolygon<f64>,
}

/// Subdivides the bounding box of `mp` into an n×n grid, clipping each
/// cell to the source geometry. Cells that fall entirely outside the
/// geometry are dropped, so the result holds between 0 and n² cells.
#[must_use]
pub fn build_grid(mp: &MultiPolygon<f64>, n: usize) -> Vec<GridCell> {
    let Some(bbox) = mp.bounding_rect() else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let steps = n as f64;
    let cell_width = bbox.width() / steps;
    let cell_height = bbox.height() / steps;

    let mut cells = Vec::new();
    for row in 0..n {
        for col in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let (i, j) = (col as f64, row as f64);
            let cell = Rect::new(
                Coord {
                    x: bbox.min().x + i * cell_width,
                    y: bbox.min().y + j * cell_height,
                },
                Coord {
                    x: bbox.min().x + (i + 1.0) * cell_width,
                    y: bbox.min().y + (j + 1.0) * cell_height,
                },
            );
            let cell_mp = MultiPolygon(vec![cell.to_polygon()]);
            if let Some(geometry) = intersection(mp, &cell_mp) {
                cells.push(GridCell { row, col, geometry });
            }
        }
    }
    cells
}

/// Polygon-clipping intersection. An empty overlap is `None`, not an
/// error.
#[must_use]
pub fn intersection(
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Option<MultiPolygon<f64>> {
    let result = a.intersection(b);
    if result.0.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Point containment test. Points inside holes count as outside.
#[must_use]
pub fn contains_point(mp: &MultiPolygon<f64>, lon: f64, lat: f64) -> bool {
    mp.contains(&Point::new(lon, lat))
}

/// Builds a concave hull around a point cluster.
///
/// Returns `None` when the cluster cannot form a meaningful hull: fewer
/// than 3 distinct points, collinear input, or a hull with an edge
/// longer than `max_edge_deg` (the cluster is too sparse and the hull
/// would sprawl over areas with no data).
#[must_use]
pub fn concave_hull(points: &[(f64, f64)], max_edge_deg: f64) -> Option<Polygon<f64>> {
    let distinct = distinct_points(points);
    if distinct.len() < 3 || all_collinear(&distinct) {
        return None;
    }

    let cloud = MultiPoint(distinct);
    let hull = cloud.concave_hull();
    if hull.exterior().0.len() < 4 {
        // Open or degenerate ring.
        return None;
    }

    let longest = hull
        .exterior()
        .lines()
        .map(|line| edge_length(line.start, line.end))
        .fold(0.0_f64, f64::max);
    if longest > max_edge_deg {
        log::debug!("Rejecting hull: edge {longest:.5}° exceeds {max_edge_deg:.5}°");
        return None;
    }

    Some(hull)
}

/// Padding, in degrees, applied around clusters too small to hull.
/// Roughly 300 m at French latitudes.
const BUFFER_PAD_DEG: f64 = 0.003;

/// Builds a buffered hull around a point cluster: the convex hull,
/// scaled about its center by `factor` so boundary points end up
/// strictly inside. Clusters that cannot form a hull (fewer than 3
/// distinct points, or collinear) fall back to their bounding box
/// padded by 0.003°, so every non-empty cluster yields an area. Stands
/// in for a metric buffer; the caller clips the result to the commune
/// anyway.
#[must_use]
pub fn buffered_hull(points: &[(f64, f64)], factor: f64) -> Option<Polygon<f64>> {
    let distinct = distinct_points(points);
    if distinct.is_empty() {
        return None;
    }

    if distinct.len() >= 3 && !all_collinear(&distinct) {
        let hull = MultiPoint(distinct.clone()).convex_hull();
        if hull.exterior().0.len() >= 4 {
            return Some(hull.scale(factor));
        }
    }
    Some(padded_bbox(&distinct))
}

fn padded_bbox(points: &[Point<f64>]) -> Polygon<f64> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x());
        min_y = min_y.min(p.y());
        max_x = max_x.max(p.x());
        max_y = max_y.max(p.y());
    }
    Rect::new(
        Coord {
            x: min_x - BUFFER_PAD_DEG,
            y: min_y - BUFFER_PAD_DEG,
        },
        Coord {
            x: max_x + BUFFER_PAD_DEG,
            y: max_y + BUFFER_PAD_DEG,
        },
    )
    .to_polygon()
}

/// Ring vertices without the closing duplicate coordinate.
fn ring_vertices(ring: &[Coord<f64>]) -> &[Coord<f64>] {
    match ring {
        [rest @ .., last] if rest.first() == Some(last) => rest,
        other => other,
    }
}

fn distinct_points(points: &[(f64, f64)]) -> Vec<Point<f64>> {
    let mut out: Vec<Point<f64>> = Vec::with_capacity(points.len());
    for &(lon, lat) in points {
        if lon.is_finite()
            && lat.is_finite()
            && !out.iter().any(|p| p.x() == lon && p.y() == lat)
        {
            out.push(Point::new(lon, lat));
        }
    }
    out
}

fn all_collinear(points: &[Point<f64>]) -> bool {
    let Some((first, rest)) = points.split_first() else {
        return true;
    };
    let Some((second, tail)) = rest.split_first() else {
        return true;
    };
    let (dx, dy) = (second.x() - first.x(), second.y() - first.y());
    tail.iter().all(|p| {
        let cross = dx * (p.y() - first.y()) - dy * (p.x() - first.x());
        cross.abs() < 1e-12
    })
}

fn edge_length(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}
