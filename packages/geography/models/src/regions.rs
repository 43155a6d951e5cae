//! Static list of metropolitan French regions.
//!
//! The region tier changes only by law (last in 2016), so it ships as a
//! constant table instead of a database fetch.

use crate::Region;

/// (code, name) pairs for the 13 metropolitan regions.
const REGIONS: [(&str, &str); 13] = [
    ("11", "Île-de-France"),
    ("24", "Centre-Val de Loire"),
    ("27", "Bourgogne-Franche-Comté"),
    ("28", "Normandie"),
    ("32", "Hauts-de-France"),
    ("44", "Grand Est"),
    ("52", "Pays de la Loire"),
    ("53", "Bretagne"),
    ("75", "Nouvelle-Aquitaine"),
    ("76", "Occitanie"),
    ("84", "Auvergne-Rhône-Alpes"),
    ("93", "Provence-Alpes-Côte d'Azur"),
    ("94", "Corse"),
];

/// Returns the static region list.
#[must_use]
pub fn all() -> Vec<Region> {
    REGIONS
        .iter()
        .map(|&(code, nom)| Region {
            code_region: code.to_string(),
            nom_region: nom.to_string(),
        })
        .collect()
}

/// Looks up a region by code.
#[must_use]
pub fn by_code(code: &str) -> Option<Region> {
    REGIONS
        .iter()
        .find(|&&(c, _)| c == code)
        .map(|&(code, nom)| Region {
            code_region: code.to_string(),
            nom_region: nom.to_string(),
        })
}
