//! In-memory [`DataStore`] implementation.
//!
//! Backs tests and local development with plain `Vec` scans. Filtering
//! semantics are identical to the SQL the production store runs, so the
//! core sees the same rows either way.

use std::collections::BTreeMap;

use async_trait::async_trait;
use prix_map_geography_models::{Commune, CommuneLimitrophe, NiveauGeographique};
use prix_map_transaction_models::Transaction;

use crate::{DataStore, GeoScope, StoreError, TransactionFilters};

/// An in-memory store over commune and transaction tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    communes: BTreeMap<String, Commune>,
    /// commune code -> codes of communes sharing a boundary.
    adjacency: BTreeMap<String, Vec<String>>,
    /// department code -> region code, for region-scoped fetches.
    departement_regions: BTreeMap<String, String>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a commune row.
    pub fn insert_commune(&mut self, commune: Commune) {
        self.communes.insert(commune.code_commune.clone(), commune);
    }

    /// Records that two communes share a boundary.
    pub fn insert_adjacency(&mut self, a: &str, b: &str) {
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .push(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .push(a.to_string());
    }

    /// Maps a department to its region, enabling region-scoped fetches.
    pub fn insert_departement_region(&mut self, code_departement: &str, code_region: &str) {
        self.departement_regions
            .insert(code_departement.to_string(), code_region.to_string());
    }

    /// Appends transaction rows.
    pub fn insert_transactions(&mut self, rows: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(rows);
    }

    fn in_scope(&self, scope: &GeoScope, t: &Transaction) -> bool {
        match scope.niveau {
            NiveauGeographique::Commune => t.code_commune == scope.code,
            NiveauGeographique::Departement => t.code_departement == scope.code,
            NiveauGeographique::Region => self
                .departement_regions
                .get(&t.code_departement)
                .is_some_and(|r| *r == scope.code),
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch_commune(&self, code_commune: &str) -> Result<Option<Commune>, StoreError> {
        Ok(self.communes.get(code_commune).cloned())
    }

    async fn fetch_transactions(
        &self,
        scope: &GeoScope,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| self.in_scope(scope, t) && filters.matches(t))
            .take(filters.limit)
            .cloned()
            .collect())
    }

    async fn fetch_commune_geometry(
        &self,
        code_commune: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .communes
            .get(code_commune)
            .and_then(|c| c.geometrie.clone()))
    }

    async fn fetch_adjacent_communes(
        &self,
        code_commune: &str,
    ) -> Result<Vec<CommuneLimitrophe>, StoreError> {
        let codes = self.adjacency.get(code_commune).cloned().unwrap_or_default();
        Ok(codes
            .iter()
            .filter_map(|code| {
                let commune = self.communes.get(code)?;
                let geometrie = commune.geometrie.clone()?;
                Some(CommuneLimitrophe {
                    code_commune: commune.code_commune.clone(),
                    nom_commune: commune.nom_commune.clone(),
                    geometrie,
                })
            })
            .collect())
    }

    async fn fetch_distinct_postal_codes(
        &self,
        code_commune: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut codes: Vec<String> = self
            .transactions
            .iter()
            .filter(|t| t.code_commune == code_commune)
            .filter_map(|t| t.code_postal.clone())
            .collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use prix_map_transaction_models::TypeLocal;

    use super::*;

    fn transaction(id: i64, code_commune: &str, type_local: Option<TypeLocal>) -> Transaction {
        Transaction {
            id,
            date_mutation: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            valeur_fonciere: 300_000.0,
            surface_reelle_bati: Some(60.0),
            longitude: Some(7.25),
            latitude: Some(43.7),
            type_local,
            code_commune: code_commune.to_string(),
            code_departement: "06".to_string(),
            code_postal: Some("06000".to_string()),
        }
    }

    #[tokio::test]
    async fn scoped_fetch_applies_filters() {
        let mut store = MemoryStore::new();
        store.insert_transactions([
            transaction(1, "06088", Some(TypeLocal::Maison)),
            transaction(2, "06088", Some(TypeLocal::LocalCommercial)),
            transaction(3, "06004", Some(TypeLocal::Appartement)),
        ]);

        let rows = store
            .fetch_transactions(
                &GeoScope::commune("06088"),
                &TransactionFilters::residential_geocoded(),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[tokio::test]
    async fn department_scope_spans_communes() {
        let mut store = MemoryStore::new();
        store.insert_transactions([
            transaction(1, "06088", Some(TypeLocal::Maison)),
            transaction(2, "06004", Some(TypeLocal::Appartement)),
        ]);

        let scope = GeoScope {
            niveau: NiveauGeographique::Departement,
            code: "06".to_string(),
        };
        let rows = store
            .fetch_transactions(&scope, &TransactionFilters::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn distinct_postal_codes_deduplicated() {
        let mut store = MemoryStore::new();
        let mut t1 = transaction(1, "06088", Some(TypeLocal::Maison));
        t1.code_postal = Some("06200".to_string());
        let t2 = transaction(2, "06088", Some(TypeLocal::Maison));
        let t3 = transaction(3, "06088", Some(TypeLocal::Maison));
        let mut t4 = transaction(4, "06088", Some(TypeLocal::Maison));
        t4.code_postal = None;
        store.insert_transactions([t1, t2, t3, t4]);

        let codes = store.fetch_distinct_postal_codes("06088").await.unwrap();
        assert_eq!(codes, vec!["06000".to_string(), "06200".to_string()]);
    }
}
