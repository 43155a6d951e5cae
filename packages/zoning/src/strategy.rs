//! Zoning strategy selection and zone construction.
//!
//! The strategy ladder is strict: each stage runs only when the
//! previous produced no usable zones. Grids serve small communes
//! directly; large communes try postal codes, then price clusters,
//! then fall back to cardinal quadrants — which always partition a
//! non-degenerate geometry.

use geo::{Coord, MultiPolygon, Rect};
use prix_map_geography_models::Commune;
use prix_map_geometry::{buffered_hull, build_grid, centroid_of, concave_hull, intersection};
use prix_map_transaction_models::Transaction;

use crate::{Zone, ZoningConfig};

/// How a commune gets partitioned, decided by its surface area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoningStrategy {
    /// n×n grid over the commune bounding box.
    Grid(usize),
    /// One zone per distinct postal code (large communes).
    Administrative,
}

impl ZoningStrategy {
    /// Picks the strategy for a commune.
    ///
    /// A missing surface area is treated as large: without a size
    /// signal the administrative ladder is the safer default.
    #[must_use]
    pub fn for_commune(surface_ha: Option<f64>, config: &ZoningConfig) -> Self {
        match surface_ha {
            Some(ha) if ha < config.small_commune_ha => Self::Grid(2),
            Some(ha) if ha < config.large_commune_ha => Self::Grid(3),
            _ => Self::Administrative,
        }
    }
}

/// Runs the strategy ladder and returns the commune's zones.
///
/// Grid communes return their grid cells directly. Administrative
/// communes walk the ladder: postal codes → price clusters →
/// quadrants.
#[must_use]
pub fn build_zones(
    commune: &Commune,
    geometry: &MultiPolygon<f64>,
    transactions: &[Transaction],
    postal_codes: &[String],
    config: &ZoningConfig,
) -> Vec<Zone> {
    match ZoningStrategy::for_commune(commune.surface_ha, config) {
        ZoningStrategy::Grid(n) => grid_zones(commune, geometry, n),
        ZoningStrategy::Administrative => {
            let zones = administrative_zones(commune, geometry, transactions, postal_codes, config);
            if !zones.is_empty() {
                return zones;
            }
            log::warn!(
                "Commune {}: no administrative zones, trying price clusters",
                commune.code_commune
            );
            let zones = price_cluster_zones(commune, geometry, transactions, config);
            if !zones.is_empty() {
                return zones;
            }
            log::warn!(
                "Commune {}: no price clusters, falling back to quadrants",
                commune.code_commune
            );
            quadrant_zones(commune, geometry)
        }
    }
}

/// n×n grid cells clipped to the commune, named "Zone A1" with the
/// letter for the column (west to east) and the number for the row
/// (south to north).
#[must_use]
pub fn grid_zones(commune: &Commune, geometry: &MultiPolygon<f64>, n: usize) -> Vec<Zone> {
    build_grid(geometry, n)
        .into_iter()
        .map(|cell| {
            let letter = char::from(b'A' + u8::try_from(cell.col % 26).unwrap_or(0));
            Zone {
                nom_zone: format!("Zone {letter}{}", cell.row + 1),
                code_commune: commune.code_commune.clone(),
                geometrie: cell.geometry,
            }
        })
        .collect()
}

/// One zone per distinct postal code, as a buffered hull around that
/// code's transaction points, clipped to the commune. Yields nothing
/// when the commune has a single postal code — the split carries no
/// information then.
#[must_use]
pub fn administrative_zones(
    commune: &Commune,
    geometry: &MultiPolygon<f64>,
    transactions: &[Transaction],
    postal_codes: &[String],
    config: &ZoningConfig,
) -> Vec<Zone> {
    if postal_codes.len() <= 1 {
        return Vec::new();
    }

    postal_codes
        .iter()
        .filter_map(|cp| {
            let points: Vec<(f64, f64)> = transactions
                .iter()
                .filter(|t| t.code_postal.as_deref() == Some(cp))
                .filter_map(Transaction::point)
                .collect();

            let hull = buffered_hull(&points, config.hull_buffer_factor)?;
            let clipped = intersection(geometry, &MultiPolygon(vec![hull]))?;
            Some(Zone {
                nom_zone: format!("{} - {cp}", commune.nom_commune),
                code_commune: commune.code_commune.clone(),
                geometrie: clipped,
            })
        })
        .collect()
}

/// French tier labels for the four quartile bands, cheapest first.
const PRICE_TIER_LABELS: [&str; 4] = [
    "Zone à prix modérés",
    "Zone à prix moyens bas",
    "Zone à prix moyens hauts",
    "Zone à prix élevés",
];

/// Quartile price bands turned into concave-hull zones.
///
/// Transactions are split at Q1/Q2/Q3 of price/m²; bands with fewer
/// than the configured minimum are skipped, as are bands whose point
/// cloud is too sparse to hull.
#[must_use]
pub fn price_cluster_zones(
    commune: &Commune,
    geometry: &MultiPolygon<f64>,
    transactions: &[Transaction],
    config: &ZoningConfig,
) -> Vec<Zone> {
    let priced: Vec<(f64, (f64, f64))> = transactions
        .iter()
        .filter_map(|t| {
            let prix = prix_map_stats::prix_m2(t.valeur_fonciere, t.surface_reelle_bati)?;
            let point = t.point()?;
            (prix > 0.0).then_some((prix, point))
        })
        .collect();
    if priced.is_empty() {
        return Vec::new();
    }

    let prices: Vec<f64> = priced.iter().map(|&(p, _)| p).collect();
    let Ok(q1) = prix_map_stats::percentile(&prices, 0.25) else {
        return Vec::new();
    };
    let Ok(q2) = prix_map_stats::percentile(&prices, 0.5) else {
        return Vec::new();
    };
    let Ok(q3) = prix_map_stats::percentile(&prices, 0.75) else {
        return Vec::new();
    };

    let band_of = |prix: f64| -> usize {
        if prix <= q1 {
            0
        } else if prix <= q2 {
            1
        } else if prix <= q3 {
            2
        } else {
            3
        }
    };

    let mut bands: [Vec<(f64, f64)>; 4] = Default::default();
    for &(prix, point) in &priced {
        bands[band_of(prix)].push(point);
    }

    PRICE_TIER_LABELS
        .iter()
        .zip(bands)
        .filter_map(|(label, points)| {
            if points.len() < config.min_cluster_transactions {
                return None;
            }
            let hull = concave_hull(&points, config.concave_max_edge_deg)?;
            let clipped = intersection(geometry, &MultiPolygon(vec![hull]))?;
            Some(Zone {
                nom_zone: (*label).to_string(),
                code_commune: commune.code_commune.clone(),
                geometrie: clipped,
            })
        })
        .collect()
}

/// Cardinal quadrants: the bounding box split at the commune centroid,
/// each intersected with the commune geometry. The guaranteed last rung
/// of the ladder.
#[must_use]
pub fn quadrant_zones(commune: &Commune, geometry: &MultiPolygon<f64>) -> Vec<Zone> {
    let (Some(center), Some(bbox)) = (
        centroid_of(geometry),
        prix_map_geometry::bounding_box_of(geometry),
    ) else {
        return Vec::new();
    };
    let (mid_x, mid_y) = (center.x(), center.y());

    let quadrants = [
        ("Secteur Nord-Est", mid_x, mid_y, bbox.max().x, bbox.max().y),
        ("Secteur Nord-Ouest", bbox.min().x, mid_y, mid_x, bbox.max().y),
        ("Secteur Sud-Est", mid_x, bbox.min().y, bbox.max().x, mid_y),
        ("Secteur Sud-Ouest", bbox.min().x, bbox.min().y, mid_x, mid_y),
    ];

    quadrants
        .iter()
        .filter_map(|&(name, min_x, min_y, max_x, max_y)| {
            if max_x <= min_x || max_y <= min_y {
                return None;
            }
            let rect = Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y });
            let clipped = intersection(geometry, &MultiPolygon(vec![rect.to_polygon()]))?;
            Some(Zone {
                nom_zone: name.to_string(),
                code_commune: commune.code_commune.clone(),
                geometrie: clipped,
            })
        })
        .collect()
}
