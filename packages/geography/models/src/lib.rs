#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative geography types.
//!
//! Regions contain departments contain communes — a strict tree keyed by
//! stable codes (INSEE for communes, ministry codes for the rest). These
//! rows are read-only for the aggregation core.

pub mod regions;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Grouping level for price statistics queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NiveauGeographique {
    /// Single commune (INSEE code).
    Commune,
    /// Department (e.g. "06", "2A").
    Departement,
    /// Region (e.g. "93" for Provence-Alpes-Côte d'Azur).
    Region,
}

/// A commune row as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commune {
    /// INSEE commune code (e.g. "06088" for Nice).
    pub code_commune: String,
    /// Display name.
    pub nom_commune: String,
    /// Owning department code.
    pub code_departement: String,
    /// Surface area in hectares, used to pick a zoning strategy.
    pub surface_ha: Option<f64>,
    /// Boundary as a raw GeoJSON geometry string (`Polygon` or
    /// `MultiPolygon`). Parsed at the geometry boundary, never consumed
    /// raw by the core.
    pub geometrie: Option<String>,
}

/// A department row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departement {
    /// Department code (two digits, or "2A"/"2B" for Corsica).
    pub code_departement: String,
    /// Display name.
    pub nom_departement: String,
    /// Owning region code.
    pub code_region: String,
}

/// A region row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region code.
    pub code_region: String,
    /// Display name.
    pub nom_region: String,
}

/// A neighboring commune sharing a boundary with the queried one.
///
/// The geometry is relayed to the map layer as-is, so it stays a raw
/// GeoJSON string here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommuneLimitrophe {
    /// INSEE commune code.
    pub code_commune: String,
    /// Display name.
    pub nom_commune: String,
    /// Boundary as a raw GeoJSON geometry string.
    pub geometrie: String,
}

/// Robust price-per-m² summary for a geographic grouping.
///
/// Values are euros/m², ceiling-rounded for display. Present only when the
/// grouping met the minimum sample threshold — a grouping below threshold
/// is absent from results entirely, never zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrixM2Stats {
    /// 10th percentile price/m².
    pub prix_m2_bas: u32,
    /// Median price/m².
    pub prix_m2_median: u32,
    /// 90th percentile price/m².
    pub prix_m2_haut: u32,
    /// Number of transactions the summary was computed from.
    pub nb_transactions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn niveau_parses_query_values() {
        assert_eq!(
            "commune".parse::<NiveauGeographique>().unwrap(),
            NiveauGeographique::Commune
        );
        assert_eq!(
            "departement".parse::<NiveauGeographique>().unwrap(),
            NiveauGeographique::Departement
        );
        assert_eq!(
            "region".parse::<NiveauGeographique>().unwrap(),
            NiveauGeographique::Region
        );
        assert!("canton".parse::<NiveauGeographique>().is_err());
    }
}
