//! Per-zone statistics aggregation.
//!
//! Maps each transaction point to its zone through an R-tree index,
//! then reduces each zone's transactions to a mean price/m², a count,
//! and a dominant property type. Zones without qualifying transactions
//! are dropped from the result, never emitted with placeholder numbers.

use geo::{BoundingRect, MultiPolygon};
use prix_map_geometry::contains_point;
use prix_map_transaction_models::{Transaction, TypeLocal};
use rstar::{AABB, RTree, RTreeObject};

use crate::Zone;

/// A zone with its aggregated price statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneAvecStats {
    /// Zone label.
    pub nom_zone: String,
    /// Owning commune.
    pub code_commune: String,
    /// Zone boundary.
    pub geometrie: MultiPolygon<f64>,
    /// Arithmetic mean price/m², rounded to the nearest euro.
    ///
    /// Deliberately a mean, not a percentile: zone-level sample sizes
    /// are too small for stable percentiles.
    pub prix_moyen_m2: u32,
    /// Number of transactions inside the zone.
    pub nb_transactions: usize,
    /// Most frequent property type among the zone's transactions.
    pub type_dominant: Option<TypeLocal>,
}

/// A zone stored in the R-tree with its index and precomputed envelope.
struct ZoneEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
    geometry: MultiPolygon<f64>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree index over zone geometries for point-to-zone attribution.
pub struct ZoneIndex {
    tree: RTree<ZoneEntry>,
}

impl ZoneIndex {
    /// Bulk-loads the index from a zone slice. Entry indexes refer back
    /// to positions in that slice.
    #[must_use]
    pub fn new(zones: &[Zone]) -> Self {
        let entries = zones
            .iter()
            .enumerate()
            .map(|(index, zone)| ZoneEntry {
                index,
                envelope: compute_envelope(&zone.geometrie),
                geometry: zone.geometrie.clone(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Finds the zone containing a point.
    ///
    /// Grid and quadrant zones tile the commune without overlap, and
    /// ladder zones rarely overlap in practice; the first hit wins.
    #[must_use]
    pub fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
        let query_env = AABB::from_point([lon, lat]);
        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| contains_point(&entry.geometry, lon, lat))
            .map(|entry| entry.index)
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

/// Accumulator for one zone's statistics.
#[derive(Default)]
struct ZoneAccumulator {
    prix_m2_total: f64,
    count: usize,
    /// Insertion-ordered type counts: ties resolve to the type seen
    /// first, an explicit policy rather than an accident of hashing.
    type_counts: Vec<(TypeLocal, usize)>,
}

impl ZoneAccumulator {
    fn add(&mut self, prix_m2: f64, type_local: Option<TypeLocal>) {
        self.prix_m2_total += prix_m2;
        self.count += 1;
        if let Some(tl) = type_local {
            if let Some(entry) = self.type_counts.iter_mut().find(|(t, _)| *t == tl) {
                entry.1 += 1;
            } else {
                self.type_counts.push((tl, 1));
            }
        }
    }

    fn dominant_type(&self) -> Option<TypeLocal> {
        let mut best: Option<(TypeLocal, usize)> = None;
        for &(tl, count) in &self.type_counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((tl, count)),
            }
        }
        best.map(|(tl, _)| tl)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn mean_prix_m2(&self) -> u32 {
        if self.count == 0 {
            return 0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = self.prix_m2_total / self.count as f64;
        mean.round().max(0.0) as u32
    }
}

/// Joins zones with their transactions and computes per-zone stats.
///
/// Only transactions with a geocoded point, a positive residential
/// price/m², and a residential type qualify. Zones that end up with
/// zero transactions are dropped.
#[must_use]
pub fn attach_zone_stats(zones: Vec<Zone>, transactions: &[Transaction]) -> Vec<ZoneAvecStats> {
    if zones.is_empty() {
        return Vec::new();
    }

    let index = ZoneIndex::new(&zones);
    let mut accumulators: Vec<ZoneAccumulator> =
        (0..zones.len()).map(|_| ZoneAccumulator::default()).collect();

    for t in transactions {
        if !t.type_local.is_some_and(TypeLocal::is_residential) {
            continue;
        }
        let Some(prix) = prix_map_stats::prix_m2(t.valeur_fonciere, t.surface_reelle_bati) else {
            continue;
        };
        if prix <= 0.0 {
            continue;
        }
        let Some((lon, lat)) = t.point() else {
            continue;
        };
        if let Some(zone_idx) = index.locate(lon, lat) {
            accumulators[zone_idx].add(prix, t.type_local);
        }
    }

    zones
        .into_iter()
        .zip(accumulators)
        .filter(|(_, acc)| acc.count > 0)
        .map(|(zone, acc)| ZoneAvecStats {
            nom_zone: zone.nom_zone,
            code_commune: zone.code_commune,
            geometrie: zone.geometrie,
            prix_moyen_m2: acc.mean_prix_m2(),
            nb_transactions: acc.count,
            type_dominant: acc.dominant_type(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use prix_map_geometry::parse_geometry;

    use super::*;

    fn zone(name: &str, geojson: &str) -> Zone {
        Zone {
            nom_zone: name.to_string(),
            code_commune: "06088".to_string(),
            geometrie: parse_geometry(geojson).unwrap(),
        }
    }

    fn west_east_zones() -> Vec<Zone> {
        vec![
            zone(
                "Ouest",
                r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.005,0.0],[0.005,0.01],[0.0,0.01],[0.0,0.0]]]}"#,
            ),
            zone(
                "Est",
                r#"{"type":"Polygon","coordinates":[[[0.005,0.0],[0.01,0.0],[0.01,0.01],[0.005,0.01],[0.005,0.0]]]}"#,
            ),
        ]
    }

    fn transaction(
        id: i64,
        lon: f64,
        valeur: f64,
        surface: f64,
        type_local: Option<TypeLocal>,
    ) -> Transaction {
        Transaction {
            id,
            date_mutation: NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(),
            valeur_fonciere: valeur,
            surface_reelle_bati: Some(surface),
            longitude: Some(lon),
            latitude: Some(0.005),
            type_local,
            code_commune: "06088".to_string(),
            code_departement: "06".to_string(),
            code_postal: Some("06000".to_string()),
        }
    }

    #[test]
    fn zone_index_attributes_points() {
        let zones = west_east_zones();
        let index = ZoneIndex::new(&zones);
        assert_eq!(index.locate(0.002, 0.005), Some(0));
        assert_eq!(index.locate(0.008, 0.005), Some(1));
        assert_eq!(index.locate(0.5, 0.5), None);
    }

    #[test]
    fn mean_count_and_dominant_type_per_zone() {
        let zones = west_east_zones();
        let transactions = vec![
            // West: prices 4000 and 6000 -> mean 5000, two apartments.
            transaction(1, 0.002, 200_000.0, 50.0, Some(TypeLocal::Appartement)),
            transaction(2, 0.003, 300_000.0, 50.0, Some(TypeLocal::Appartement)),
            // East: one house.
            transaction(3, 0.008, 250_000.0, 50.0, Some(TypeLocal::Maison)),
        ];

        let stats = attach_zone_stats(zones, &transactions);
        assert_eq!(stats.len(), 2);

        let west = stats.iter().find(|z| z.nom_zone == "Ouest").unwrap();
        assert_eq!(west.prix_moyen_m2, 5000);
        assert_eq!(west.nb_transactions, 2);
        assert_eq!(west.type_dominant, Some(TypeLocal::Appartement));

        let east = stats.iter().find(|z| z.nom_zone == "Est").unwrap();
        assert_eq!(east.prix_moyen_m2, 5000);
        assert_eq!(east.nb_transactions, 1);
        assert_eq!(east.type_dominant, Some(TypeLocal::Maison));
    }

    #[test]
    fn empty_zones_are_dropped() {
        let zones = west_east_zones();
        let transactions = vec![transaction(
            1,
            0.002,
            200_000.0,
            50.0,
            Some(TypeLocal::Appartement),
        )];

        let stats = attach_zone_stats(zones, &transactions);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].nom_zone, "Ouest");
    }

    #[test]
    fn non_residential_and_unpriced_rows_excluded() {
        let zones = west_east_zones();
        let mut no_surface = transaction(2, 0.002, 300_000.0, 50.0, Some(TypeLocal::Maison));
        no_surface.surface_reelle_bati = None;
        let transactions = vec![
            transaction(1, 0.002, 200_000.0, 50.0, Some(TypeLocal::LocalCommercial)),
            no_surface,
            transaction(3, 0.002, 200_000.0, 50.0, None),
        ];

        assert!(attach_zone_stats(zones, &transactions).is_empty());
    }

    #[test]
    fn dominant_type_tie_breaks_to_first_encountered() {
        let zones = west_east_zones();
        let transactions = vec![
            transaction(1, 0.002, 200_000.0, 50.0, Some(TypeLocal::Maison)),
            transaction(2, 0.003, 250_000.0, 50.0, Some(TypeLocal::Appartement)),
        ];

        let stats = attach_zone_stats(zones, &transactions);
        assert_eq!(stats[0].type_dominant, Some(TypeLocal::Maison));
    }
}
