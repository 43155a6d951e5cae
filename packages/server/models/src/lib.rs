#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the prix-map server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the domain types so the API contract can evolve
//! independently of the computation core.

use prix_map_geography_models::{CommuneLimitrophe, PrixM2Stats};
use prix_map_transaction_models::TypeLocal;
use prix_map_zoning::ZoneAvecStats;
use serde::{Deserialize, Serialize};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always true when the server responds.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
}

/// A zone with statistics, as returned by `/api/stats-zones`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    /// Zone label.
    pub nom_zone: String,
    /// Owning commune INSEE code.
    pub code_commune: String,
    /// Zone boundary as a GeoJSON geometry string, ready for the map
    /// layer.
    pub geojson: String,
    /// Mean price/m² in euros.
    pub prix_moyen_m2: u32,
    /// Transactions inside the zone.
    pub nb_transactions: usize,
    /// Dominant property type, by its DVF display string.
    pub type_local: Option<String>,
}

impl From<ZoneAvecStats> for ApiZone {
    fn from(zone: ZoneAvecStats) -> Self {
        Self {
            nom_zone: zone.nom_zone,
            code_commune: zone.code_commune,
            geojson: prix_map_geometry::to_geojson_string(&zone.geometrie),
            prix_moyen_m2: zone.prix_moyen_m2,
            nb_transactions: zone.nb_transactions,
            type_local: zone.type_dominant.map(|t| t.to_string()),
        }
    }
}

/// One per-type price summary row, as returned by `/api/prix-m2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrixM2 {
    /// Property type display string.
    pub type_logement: String,
    /// 10th percentile price/m².
    pub prix_m2_bas: u32,
    /// Median price/m².
    pub prix_m2_median: u32,
    /// 90th percentile price/m².
    pub prix_m2_haut: u32,
    /// Transactions behind the summary.
    pub nb_transactions: usize,
}

impl From<(TypeLocal, PrixM2Stats)> for ApiPrixM2 {
    fn from((type_local, stats): (TypeLocal, PrixM2Stats)) -> Self {
        Self {
            type_logement: type_local.to_string(),
            prix_m2_bas: stats.prix_m2_bas,
            prix_m2_median: stats.prix_m2_median,
            prix_m2_haut: stats.prix_m2_haut,
            nb_transactions: stats.nb_transactions,
        }
    }
}

/// An adjacent commune, as returned by `/api/communes-limitrophes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommuneLimitrophe {
    /// INSEE commune code.
    pub code_commune: String,
    /// Display name.
    pub nom_commune: String,
    /// Boundary as a GeoJSON geometry string.
    pub geojson: String,
}

impl From<CommuneLimitrophe> for ApiCommuneLimitrophe {
    fn from(c: CommuneLimitrophe) -> Self {
        Self {
            code_commune: c.code_commune,
            nom_commune: c.nom_commune,
            geojson: c.geometrie,
        }
    }
}

/// Query parameters for `/api/stats-zones` and
/// `/api/communes-limitrophes`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommuneQueryParams {
    /// INSEE commune code.
    pub code_commune: Option<String>,
}

/// Query parameters for `/api/prix-m2`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrixM2QueryParams {
    /// Grouping level: commune, departement, or region.
    pub niveau: Option<String>,
    /// Code at that level.
    pub code: Option<String>,
    /// Optional property type filter (DVF display string).
    pub type_local: Option<String>,
}

/// Query parameters for `/api/render-params`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderParamsQueryParams {
    /// Map zoom level.
    pub zoom: Option<u8>,
}
