#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data-access boundary for the price aggregation core.
//!
//! The core never talks to a concrete database: it receives a
//! [`DataStore`] reference and calls the fetch operations it needs. The
//! backing implementation (`PostGIS` in production, [`MemoryStore`] in
//! tests and local development) owns connection state, caching, and
//! timeouts — none of that leaks into the aggregation code.

pub mod memory;

use async_trait::async_trait;
use prix_map_geography_models::{Commune, CommuneLimitrophe, NiveauGeographique};
use prix_map_transaction_models::{Transaction, TypeLocal};
use thiserror::Error;

pub use memory::MemoryStore;

/// Default row cap for transaction fetches, matching the original API's
/// `limit=1000` page size.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 1000;

/// Errors that can occur at the store boundary.
///
/// Store failures are always propagated — a failed fetch must never be
/// silently turned into an empty result, because "no transactions" is a
/// meaningful answer of its own.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store or network failed.
    #[error("Upstream fetch failed: {message}")]
    UpstreamFetchFailed {
        /// Description of what went wrong.
        message: String,
    },
    /// A row could not be converted into its model type.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Geographic scope of a transaction fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoScope {
    /// Grouping level the code refers to.
    pub niveau: NiveauGeographique,
    /// Commune, department, or region code.
    pub code: String,
}

impl GeoScope {
    /// Scope covering a single commune.
    #[must_use]
    pub fn commune(code: impl Into<String>) -> Self {
        Self {
            niveau: NiveauGeographique::Commune,
            code: code.into(),
        }
    }
}

/// Row filters applied by the store before returning transactions.
///
/// These mirror the WHERE clauses the original SQL applied: the core
/// relies on the store for coarse filtering and only refines
/// geometrically.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilters {
    /// Restrict to these property types. `None` means no type filter.
    pub types: Option<Vec<TypeLocal>>,
    /// Drop rows without a geocoded point.
    pub require_coordinates: bool,
    /// Drop rows without a positive built surface.
    pub require_surface: bool,
    /// Maximum number of rows to return.
    pub limit: usize,
}

impl Default for TransactionFilters {
    fn default() -> Self {
        Self {
            types: None,
            require_coordinates: false,
            require_surface: false,
            limit: DEFAULT_TRANSACTION_LIMIT,
        }
    }
}

impl TransactionFilters {
    /// The filter used by every pricing path: residential types, positive
    /// surface, geocoded point.
    #[must_use]
    pub fn residential_geocoded() -> Self {
        Self {
            types: Some(TypeLocal::residential().to_vec()),
            require_coordinates: true,
            require_surface: true,
            limit: DEFAULT_TRANSACTION_LIMIT,
        }
    }

    /// Whether a transaction passes this filter.
    #[must_use]
    pub fn matches(&self, t: &Transaction) -> bool {
        if self.require_coordinates && t.point().is_none() {
            return false;
        }
        if self.require_surface && !t.surface_reelle_bati.is_some_and(|s| s > 0.0) {
            return false;
        }
        if let Some(types) = &self.types {
            match t.type_local {
                Some(tl) if types.contains(&tl) => {}
                _ => return false,
            }
        }
        t.valeur_fonciere > 0.0
    }
}

/// The injected data-access interface consumed by the aggregation core.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetches a commune row (name, surface, geometry) by INSEE code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the fetch fails.
    async fn fetch_commune(&self, code_commune: &str) -> Result<Option<Commune>, StoreError>;

    /// Fetches transactions in a geographic scope, store-side filtered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the fetch fails.
    async fn fetch_transactions(
        &self,
        scope: &GeoScope,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Fetches a commune's boundary as a raw GeoJSON geometry string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the fetch fails.
    async fn fetch_commune_geometry(
        &self,
        code_commune: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Fetches the communes sharing a boundary with the given one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the fetch fails.
    async fn fetch_adjacent_communes(
        &self,
        code_commune: &str,
    ) -> Result<Vec<CommuneLimitrophe>, StoreError>;

    /// Fetches the distinct non-null postal codes appearing in a
    /// commune's transactions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the fetch fails.
    async fn fetch_distinct_postal_codes(
        &self,
        code_commune: &str,
    ) -> Result<Vec<String>, StoreError>;
}
