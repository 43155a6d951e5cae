#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Commune zoning engine.
//!
//! Partitions a commune into named sub-zones (grid cells, postal-code
//! hulls, price clusters, or quadrants), attaches per-zone price
//! statistics, and computes commune/department/region price summaries.
//! All zones are ephemeral: built per request, discarded with the
//! response.
//!
//! The only suspension points are the [`DataStore`] fetches. Once
//! transaction data is in memory the zoning and aggregation run to
//! completion synchronously — their cost is bounded by the store's
//! transaction limit.

pub mod aggregate;
pub mod strategy;

use geo::MultiPolygon;
use prix_map_database::{DataStore, GeoScope, StoreError, TransactionFilters};
use prix_map_geography_models::{NiveauGeographique, PrixM2Stats};
use prix_map_stats::SummaryOptions;
use prix_map_transaction_models::TypeLocal;
use thiserror::Error;

pub use aggregate::{ZoneAvecStats, ZoneIndex, attach_zone_stats};
pub use strategy::{ZoningStrategy, build_zones};

/// Errors from a zoning computation.
#[derive(Debug, Error)]
pub enum ZoningError {
    /// The commune code is unknown.
    #[error("Commune not found: {code_commune}")]
    CommuneNotFound {
        /// INSEE commune code.
        code_commune: String,
    },
    /// The commune has no usable boundary geometry.
    #[error("No geometry for commune {code_commune}")]
    NoGeometry {
        /// INSEE commune code.
        code_commune: String,
    },
    /// No zone ended up with qualifying transactions.
    #[error("No transaction data for commune {code_commune}")]
    NoData {
        /// INSEE commune code.
        code_commune: String,
    },
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Thresholds and tuning for the zoning ladder.
///
/// Defaults are the values observed in production; they are exposed as
/// configuration rather than hard-coded so domain owners can adjust
/// them without a release.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoningConfig {
    /// Communes under this surface (hectares) get a 2×2 grid.
    pub small_commune_ha: f64,
    /// Communes under this surface get a 3×3 grid; at or above it the
    /// administrative ladder starts.
    pub large_commune_ha: f64,
    /// Price-cluster bands with fewer transactions are skipped.
    pub min_cluster_transactions: usize,
    /// Maximum concave-hull edge length, in degrees.
    pub concave_max_edge_deg: f64,
    /// Scale factor for postal-code buffered hulls.
    pub hull_buffer_factor: f64,
}

impl Default for ZoningConfig {
    fn default() -> Self {
        Self {
            small_commune_ha: 500.0,
            large_commune_ha: 1000.0,
            min_cluster_transactions: 5,
            concave_max_edge_deg: 0.01,
            hull_buffer_factor: 1.15,
        }
    }
}

/// An ephemeral geographic subdivision of a commune.
///
/// The geometry is always a subset of the owning commune's geometry:
/// every construction path clips against the commune boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Human-readable label ("Zone A1", "Secteur Nord-Est", a postal
    /// code, or a price tier).
    pub nom_zone: String,
    /// Owning commune.
    pub code_commune: String,
    /// Zone boundary.
    pub geometrie: MultiPolygon<f64>,
}

/// Computes the zoned price statistics for a commune.
///
/// Fetches the commune and its transactions, runs the zoning ladder,
/// attaches per-zone statistics, and returns only zones that contain
/// data.
///
/// # Errors
///
/// * [`ZoningError::CommuneNotFound`] for an unknown code.
/// * [`ZoningError::NoGeometry`] when the boundary is missing or
///   malformed (logged and treated as absent, per policy).
/// * [`ZoningError::NoData`] when no zone contains a qualifying
///   transaction.
/// * [`ZoningError::Store`] when a fetch fails.
pub async fn compute_zone_statistics(
    store: &dyn DataStore,
    code_commune: &str,
    config: &ZoningConfig,
) -> Result<Vec<ZoneAvecStats>, ZoningError> {
    let commune = store.fetch_commune(code_commune).await?.ok_or_else(|| {
        ZoningError::CommuneNotFound {
            code_commune: code_commune.to_string(),
        }
    })?;

    let geometry_str = match &commune.geometrie {
        Some(g) => Some(g.clone()),
        None => store.fetch_commune_geometry(code_commune).await?,
    };
    let geometry_str = geometry_str.ok_or_else(|| ZoningError::NoGeometry {
        code_commune: code_commune.to_string(),
    })?;

    let geometry = match prix_map_geometry::parse_geometry(&geometry_str) {
        Ok(g) => g,
        Err(e) => {
            log::warn!("Unusable geometry for commune {code_commune}: {e}");
            return Err(ZoningError::NoGeometry {
                code_commune: code_commune.to_string(),
            });
        }
    };

    let transactions = store
        .fetch_transactions(
            &GeoScope::commune(code_commune),
            &TransactionFilters::residential_geocoded(),
        )
        .await?;

    let strategy = ZoningStrategy::for_commune(commune.surface_ha, config);
    let postal_codes = if strategy == ZoningStrategy::Administrative {
        store.fetch_distinct_postal_codes(code_commune).await?
    } else {
        Vec::new()
    };

    let zones = build_zones(
        &commune,
        &geometry,
        &transactions,
        &postal_codes,
        config,
    );
    log::debug!(
        "Commune {code_commune}: {} zones via {strategy:?}",
        zones.len()
    );

    let with_stats = attach_zone_stats(zones, &transactions);
    if with_stats.is_empty() {
        return Err(ZoningError::NoData {
            code_commune: code_commune.to_string(),
        });
    }
    Ok(with_stats)
}

/// Robust price-per-m² summary for a commune, department, or region.
///
/// Returns `None` when the grouping has fewer qualifying transactions
/// than the summary minimum — callers render a "no data" state.
///
/// # Errors
///
/// Returns [`StoreError`] if the transaction fetch fails.
pub async fn compute_prix_m2(
    store: &dyn DataStore,
    niveau: NiveauGeographique,
    code: &str,
    options: &SummaryOptions,
) -> Result<Option<PrixM2Stats>, StoreError> {
    let transactions = store
        .fetch_transactions(
            &GeoScope {
                niveau,
                code: code.to_string(),
            },
            &scope_filters(options),
        )
        .await?;
    Ok(prix_map_stats::summarize(&transactions, options))
}

/// Per-property-type variant of [`compute_prix_m2`].
///
/// # Errors
///
/// Returns [`StoreError`] if the transaction fetch fails.
pub async fn compute_prix_m2_par_type(
    store: &dyn DataStore,
    niveau: NiveauGeographique,
    code: &str,
    options: &SummaryOptions,
) -> Result<Vec<(TypeLocal, PrixM2Stats)>, StoreError> {
    let transactions = store
        .fetch_transactions(
            &GeoScope {
                niveau,
                code: code.to_string(),
            },
            &scope_filters(options),
        )
        .await?;
    Ok(prix_map_stats::summarize_par_type(&transactions, options))
}

/// Percentile summaries need surface and value, not coordinates.
fn scope_filters(options: &SummaryOptions) -> TransactionFilters {
    TransactionFilters {
        types: options.types.clone(),
        require_coordinates: false,
        require_surface: true,
        ..TransactionFilters::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use prix_map_database::MemoryStore;
    use prix_map_geography_models::Commune;
    use prix_map_transaction_models::Transaction;

    use super::*;

    /// 1 km² square commune around the origin, as raw GeoJSON.
    fn square_geometry() -> String {
        r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.01,0.0],[0.01,0.01],[0.0,0.01],[0.0,0.0]]]}"#
            .to_string()
    }

    fn commune(surface_ha: Option<f64>, geometrie: Option<String>) -> Commune {
        Commune {
            code_commune: "06088".to_string(),
            nom_commune: "Nice".to_string(),
            code_departement: "06".to_string(),
            surface_ha,
            geometrie,
        }
    }

    fn transaction(id: i64, lon: f64, lat: f64, valeur: f64, surface: f64) -> Transaction {
        Transaction {
            id,
            date_mutation: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            valeur_fonciere: valeur,
            surface_reelle_bati: Some(surface),
            longitude: Some(lon),
            latitude: Some(lat),
            type_local: Some(TypeLocal::Appartement),
            code_commune: "06088".to_string(),
            code_departement: "06".to_string(),
            code_postal: Some("06000".to_string()),
        }
    }

    fn seeded_store(surface_ha: Option<f64>) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_commune(commune(surface_ha, Some(square_geometry())));
        // Spread transactions over all four grid quadrants.
        let spots = [
            (0.002, 0.002),
            (0.003, 0.002),
            (0.007, 0.003),
            (0.008, 0.002),
            (0.002, 0.008),
            (0.003, 0.007),
            (0.007, 0.008),
            (0.008, 0.007),
        ];
        store.insert_transactions(spots.iter().enumerate().map(|(i, &(lon, lat))| {
            transaction(i64::try_from(i).unwrap(), lon, lat, 300_000.0, 60.0)
        }));
        store
    }

    #[tokio::test]
    async fn small_commune_gets_grid_zones_with_stats() {
        let store = seeded_store(Some(300.0));
        let zones = compute_zone_statistics(&store, "06088", &ZoningConfig::default())
            .await
            .unwrap();

        assert_eq!(zones.len(), 4);
        assert!(zones.iter().all(|z| z.nom_zone.starts_with("Zone ")));
        assert!(zones.iter().all(|z| z.nb_transactions == 2));
        assert!(zones.iter().all(|z| z.prix_moyen_m2 == 5000));
    }

    #[tokio::test]
    async fn unknown_commune_is_an_error() {
        let store = MemoryStore::new();
        let err = compute_zone_statistics(&store, "00000", &ZoningConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoningError::CommuneNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_geometry_is_an_error() {
        let mut store = MemoryStore::new();
        store.insert_commune(commune(Some(300.0), None));
        let err = compute_zone_statistics(&store, "06088", &ZoningConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoningError::NoGeometry { .. }));
    }

    #[tokio::test]
    async fn malformed_geometry_is_an_error() {
        let mut store = MemoryStore::new();
        store.insert_commune(commune(Some(300.0), Some("not geojson".to_string())));
        let err = compute_zone_statistics(&store, "06088", &ZoningConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoningError::NoGeometry { .. }));
    }

    #[tokio::test]
    async fn commune_without_transactions_has_no_data() {
        let mut store = MemoryStore::new();
        store.insert_commune(commune(Some(300.0), Some(square_geometry())));
        let err = compute_zone_statistics(&store, "06088", &ZoningConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoningError::NoData { .. }));
    }

    #[tokio::test]
    async fn prix_m2_absent_below_minimum() {
        let store = seeded_store(Some(300.0));
        // 8 transactions < 10 minimum.
        let stats = compute_prix_m2(
            &store,
            NiveauGeographique::Commune,
            "06088",
            &SummaryOptions::default(),
        )
        .await
        .unwrap();
        assert!(stats.is_none());

        let relaxed = SummaryOptions {
            min_transactions: 5,
            ..SummaryOptions::default()
        };
        let stats = compute_prix_m2(&store, NiveauGeographique::Commune, "06088", &relaxed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.prix_m2_median, 5000);
        assert_eq!(stats.nb_transactions, 8);
    }
}
