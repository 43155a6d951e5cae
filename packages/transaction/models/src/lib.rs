#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! DVF (Demandes de Valeurs Foncières) transaction row types.
//!
//! This crate defines the canonical transaction record shared across the
//! prix-map system. Field names follow the DVF open-data column names
//! (`valeur_fonciere`, `surface_reelle_bati`, ...) so rows round-trip
//! through the store and the API without renaming.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Property type of a mutation, as recorded in the DVF `type_local` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TypeLocal {
    /// Single-family house.
    #[strum(serialize = "Maison")]
    #[serde(rename = "Maison")]
    Maison,
    /// Apartment in a multi-unit building.
    #[strum(serialize = "Appartement")]
    #[serde(rename = "Appartement")]
    Appartement,
    /// Industrial or commercial premises.
    #[strum(serialize = "Local industriel. commercial ou assimilé")]
    #[serde(rename = "Local industriel. commercial ou assimilé")]
    LocalCommercial,
    /// Outbuilding (garage, cellar, ...).
    #[strum(serialize = "Dépendance")]
    #[serde(rename = "Dépendance")]
    Dependance,
}

impl TypeLocal {
    /// The residential types relevant to price-per-m² statistics.
    ///
    /// DVF surface areas are only meaningful for dwellings; commercial
    /// premises and outbuildings skew the price distributions.
    #[must_use]
    pub const fn residential() -> [Self; 2] {
        [Self::Maison, Self::Appartement]
    }

    /// Whether this type participates in residential price statistics.
    #[must_use]
    pub fn is_residential(self) -> bool {
        Self::residential().contains(&self)
    }
}

/// A single recorded property sale (one DVF mutation line).
///
/// Immutable once ingested: the core only reads and aggregates these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique row ID.
    pub id: i64,
    /// Date the mutation was recorded.
    pub date_mutation: NaiveDate,
    /// Sale price in euros. Positive for any row the store returns.
    pub valeur_fonciere: f64,
    /// Built surface area in m². `None` for land-only mutations.
    pub surface_reelle_bati: Option<f64>,
    /// Longitude of the parcel, when geocoded.
    pub longitude: Option<f64>,
    /// Latitude of the parcel, when geocoded.
    pub latitude: Option<f64>,
    /// Property type, when recorded.
    pub type_local: Option<TypeLocal>,
    /// INSEE commune code.
    pub code_commune: String,
    /// Department code (e.g. "06", "2A").
    pub code_departement: String,
    /// Postal code, when recorded. Distinct from the INSEE code: a large
    /// commune can span several postal codes.
    pub code_postal: Option<String>,
}

impl Transaction {
    /// The geocoded point as `(longitude, latitude)`, when both are present.
    #[must_use]
    pub const fn point(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_local_parses_dvf_strings() {
        assert_eq!("Maison".parse::<TypeLocal>().unwrap(), TypeLocal::Maison);
        assert_eq!(
            "Appartement".parse::<TypeLocal>().unwrap(),
            TypeLocal::Appartement
        );
        assert_eq!(
            "Local industriel. commercial ou assimilé"
                .parse::<TypeLocal>()
                .unwrap(),
            TypeLocal::LocalCommercial
        );
    }

    #[test]
    fn residential_filter() {
        assert!(TypeLocal::Maison.is_residential());
        assert!(TypeLocal::Appartement.is_residential());
        assert!(!TypeLocal::LocalCommercial.is_residential());
        assert!(!TypeLocal::Dependance.is_residential());
    }

    #[test]
    fn point_requires_both_coordinates() {
        let mut t = Transaction {
            id: 1,
            date_mutation: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            valeur_fonciere: 250_000.0,
            surface_reelle_bati: Some(70.0),
            longitude: Some(7.26),
            latitude: None,
            type_local: Some(TypeLocal::Appartement),
            code_commune: "06088".to_string(),
            code_departement: "06".to_string(),
            code_postal: Some("06000".to_string()),
        };
        assert_eq!(t.point(), None);
        t.latitude = Some(43.7);
        assert_eq!(t.point(), Some((7.26, 43.7)));
    }
}
