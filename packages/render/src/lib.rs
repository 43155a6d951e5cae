#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Adaptive rendering parameters for the price map.
//!
//! Turns aggregated numbers into visual encodings: heatmap kernel sizes
//! per zoom level, a discrete color scale over a normalized price
//! range, heatmap point intensities, and the viewport center. The map
//! library itself is an external collaborator — this crate only feeds
//! its layer API.

use geo::MultiPolygon;
use prix_map_transaction_models::Transaction;
use serde::{Deserialize, Serialize};

/// Heatmap kernel parameters for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderParams {
    /// Kernel radius in pixels.
    pub radius: u32,
    /// Kernel blur in pixels.
    pub blur: u32,
}

/// Heatmap kernel radius for a zoom level, in pixels.
///
/// Lower zoom shows more area per pixel, so the kernel shrinks to keep
/// dense areas readable; higher zoom grows it so isolated points stay
/// visible.
#[must_use]
pub const fn radius_for_zoom(zoom: u8) -> u32 {
    match zoom {
        0..=9 => 5,
        10..=11 => 8,
        12..=13 => 12,
        14..=15 => 18,
        _ => 25,
    }
}

/// Heatmap kernel blur for a zoom level, in pixels.
#[must_use]
pub const fn blur_for_zoom(zoom: u8) -> u32 {
    match zoom {
        0..=9 => 3,
        10..=11 => 5,
        12..=13 => 8,
        14..=15 => 12,
        _ => 15,
    }
}

/// Radius and blur for a zoom level.
#[must_use]
pub const fn render_params_for_zoom(zoom: u8) -> RenderParams {
    RenderParams {
        radius: radius_for_zoom(zoom),
        blur: blur_for_zoom(zoom),
    }
}

/// Neutral "no data" color. Used whenever the price cannot be placed
/// on the scale — it is an explicit signal, never an extrapolation.
pub const COLOR_NO_DATA: &str = "#CCCCCC";

/// Five-band palette, cheapest to most expensive.
const PRICE_PALETTE: [&str; 5] = ["#32CD32", "#FFD700", "#FFA500", "#FF8C00", "#FF4500"];

/// Maps a price to a palette color, normalized against `[min, max]`.
///
/// Returns [`COLOR_NO_DATA`] for an absent/non-positive price or a
/// degenerate range (`min == max`): a zero price looks valid and is
/// semantically wrong, so it gets the sentinel too.
#[must_use]
pub fn color_for_price(prix_m2: f64, min_price: f64, max_price: f64) -> &'static str {
    if !prix_m2.is_finite() || prix_m2 <= 0.0 || min_price >= max_price {
        return COLOR_NO_DATA;
    }

    let normalized = (prix_m2 - min_price) / (max_price - min_price);
    if normalized >= 0.8 {
        PRICE_PALETTE[4]
    } else if normalized >= 0.6 {
        PRICE_PALETTE[3]
    } else if normalized >= 0.4 {
        PRICE_PALETTE[2]
    } else if normalized >= 0.2 {
        PRICE_PALETTE[1]
    } else {
        PRICE_PALETTE[0]
    }
}

/// Price/m² range a rendering context normalizes colors against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Lowest price/m² after outlier trimming.
    pub min_price: f64,
    /// Highest price/m² after outlier trimming.
    pub max_price: f64,
}

/// Computes the color-normalization range from a transaction set.
///
/// Prices are outlier-trimmed first so a single extreme sale does not
/// compress the visible color range for everything else. `None` when
/// no transaction yields a positive price/m².
#[must_use]
pub fn price_range(transactions: &[Transaction]) -> Option<PriceRange> {
    let prices: Vec<f64> = transactions
        .iter()
        .filter_map(|t| prix_map_stats::prix_m2(t.valeur_fonciere, t.surface_reelle_bati))
        .filter(|&p| p > 0.0)
        .collect();
    if prices.is_empty() {
        return None;
    }

    let trimmed = prix_map_stats::remove_outliers(&prices);
    let (mut min_price, mut max_price) = (f64::INFINITY, f64::NEG_INFINITY);
    for &p in &trimmed {
        min_price = min_price.min(p);
        max_price = max_price.max(p);
    }
    Some(PriceRange {
        min_price,
        max_price,
    })
}

/// Price/m² at which heatmap intensity saturates.
const HEATMAP_SATURATION_PRIX_M2: f64 = 10_000.0;

/// Gradient stops for the heatmap layer, position → color.
pub const HEATMAP_GRADIENT: [(f64, &str); 5] = [
    (0.0, "green"),
    (0.3, "lime"),
    (0.5, "yellow"),
    (0.7, "orange"),
    (1.0, "red"),
];

/// One weighted point of the heatmap layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Kernel weight in `[0, 1]`, saturating at 10 000 €/m².
    pub intensity: f64,
}

/// Builds the weighted point list for the heatmap layer.
///
/// Transactions without a point or a positive price/m² are skipped.
#[must_use]
pub fn heatmap_points(transactions: &[Transaction]) -> Vec<HeatmapPoint> {
    transactions
        .iter()
        .filter_map(|t| {
            let (lon, lat) = t.point()?;
            let prix = prix_map_stats::prix_m2(t.valeur_fonciere, t.surface_reelle_bati)?;
            (prix > 0.0).then_some(HeatmapPoint {
                lat,
                lon,
                intensity: (prix / HEATMAP_SATURATION_PRIX_M2).min(1.0),
            })
        })
        .collect()
}

/// Fallback viewport center for degenerate geometry (Nice). The map
/// must always render something.
pub const DEFAULT_CENTER: (f64, f64) = (43.7, 7.2);

/// Viewport center `(lat, lon)` for a commune geometry.
///
/// Missing or degenerate geometry falls back to [`DEFAULT_CENTER`]
/// with a warning instead of failing the page.
#[must_use]
pub fn map_center(geometry: Option<&MultiPolygon<f64>>) -> (f64, f64) {
    geometry
        .and_then(prix_map_geometry::centroid_of)
        .map_or_else(
            || {
                log::warn!("No usable geometry for viewport center, using default");
                DEFAULT_CENTER
            },
            |c| (c.y(), c.x()),
        )
}
