#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Robust price-per-m² statistics.
//!
//! Pure functions over numeric series and transaction slices — no I/O.
//! Percentiles use `PERCENTILE_CONT` semantics (linear interpolation
//! between bracketing order statistics) so results match the SQL path
//! bit for bit. Edge cases resolve to "absent", never to zero: a zero
//! price looks valid and is semantically wrong.

use prix_map_geography_models::PrixM2Stats;
use prix_map_transaction_models::{Transaction, TypeLocal};
use thiserror::Error;

/// Minimum transactions a grouping needs before a summary is reported.
/// Below this, percentiles are noise and the grouping is omitted.
pub const MIN_SUMMARY_TRANSACTIONS: usize = 10;

/// Minimum values the IQR filter needs to detect outliers at all.
const MIN_OUTLIER_SAMPLES: usize = 4;

/// Errors from statistical computations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The input series was too small for the requested computation.
    #[error("Insufficient data: {needed} values needed, got {got}")]
    InsufficientData {
        /// Minimum number of values required.
        needed: usize,
        /// Number of values provided.
        got: usize,
    },
}

/// Continuous percentile (`PERCENTILE_CONT`): sorts ascending and
/// interpolates linearly at position `p × (n − 1)`.
///
/// `p` is clamped to `[0, 1]`.
///
/// # Errors
///
/// Returns [`StatsError::InsufficientData`] for an empty series.
pub fn percentile(values: &[f64], p: f64) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::InsufficientData { needed: 1, got: 0 });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = pos.floor() as usize;
    let frac = pos - pos.floor();

    let low = sorted[lower];
    let high = sorted[(lower + 1).min(sorted.len() - 1)];
    Ok(low + frac * (high - low))
}

/// Interquartile-range outlier filter.
///
/// Retains values within `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`, quartiles per
/// [`percentile`]. Fewer than 4 values pass through unchanged — too
/// little data to call anything an outlier, by policy. The result is
/// sorted ascending.
#[must_use]
pub fn remove_outliers(values: &[f64]) -> Vec<f64> {
    if values.len() < MIN_OUTLIER_SAMPLES {
        return values.to_vec();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Sorted non-empty input: the quartiles cannot fail.
    let q1 = percentile(&sorted, 0.25).unwrap_or(sorted[0]);
    let q3 = percentile(&sorted, 0.75).unwrap_or(sorted[sorted.len() - 1]);
    let iqr = q3 - q1;
    let lower = 1.5f64.mul_add(-iqr, q1);
    let upper = 1.5f64.mul_add(iqr, q3);

    sorted
        .into_iter()
        .filter(|&v| v >= lower && v <= upper)
        .collect()
}

/// Price per m², defined only for finite inputs and positive surface.
///
/// Anything else is absent — a division by zero surface must never leak
/// an `Infinity` or `NaN` into downstream aggregates.
#[must_use]
pub fn prix_m2(valeur_fonciere: f64, surface_reelle_bati: Option<f64>) -> Option<f64> {
    let surface = surface_reelle_bati?;
    if valeur_fonciere.is_finite() && surface.is_finite() && surface > 0.0 {
        Some(valeur_fonciere / surface)
    } else {
        None
    }
}

/// Options for [`summarize`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// Groupings with fewer qualifying transactions are omitted.
    pub min_transactions: usize,
    /// Property types considered. `None` disables the type filter.
    pub types: Option<Vec<TypeLocal>>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            min_transactions: MIN_SUMMARY_TRANSACTIONS,
            types: Some(TypeLocal::residential().to_vec()),
        }
    }
}

impl SummaryOptions {
    fn accepts_type(&self, type_local: Option<TypeLocal>) -> bool {
        match &self.types {
            None => true,
            Some(types) => type_local.is_some_and(|tl| types.contains(&tl)),
        }
    }
}

/// Robust price-per-m² summary over a transaction slice.
///
/// Filters to positive value and surface and the configured property
/// types, then reports P10/P50/P90 of price/m², ceiling-rounded to
/// integer euros. Returns `None` below the minimum sample count — the
/// grouping is reported as "no data", never as a degenerate number.
#[must_use]
pub fn summarize(transactions: &[Transaction], options: &SummaryOptions) -> Option<PrixM2Stats> {
    let prices: Vec<f64> = transactions
        .iter()
        .filter(|t| options.accepts_type(t.type_local))
        .filter_map(|t| prix_m2(t.valeur_fonciere, t.surface_reelle_bati))
        .filter(|&p| p > 0.0)
        .collect();

    if prices.len() < options.min_transactions.max(1) {
        return None;
    }

    // Non-empty by the check above.
    let bas = percentile(&prices, 0.1).ok()?;
    let median = percentile(&prices, 0.5).ok()?;
    let haut = percentile(&prices, 0.9).ok()?;

    Some(PrixM2Stats {
        prix_m2_bas: ceil_euros(bas),
        prix_m2_median: ceil_euros(median),
        prix_m2_haut: ceil_euros(haut),
        nb_transactions: prices.len(),
    })
}

/// Per-property-type summaries (the commune page shows Maison and
/// Appartement rows separately). Types below the sample minimum are
/// omitted from the result.
#[must_use]
pub fn summarize_par_type(
    transactions: &[Transaction],
    options: &SummaryOptions,
) -> Vec<(TypeLocal, PrixM2Stats)> {
    let candidates = options
        .types
        .clone()
        .unwrap_or_else(|| TypeLocal::residential().to_vec());

    candidates
        .into_iter()
        .filter_map(|tl| {
            let per_type = SummaryOptions {
                min_transactions: options.min_transactions,
                types: Some(vec![tl]),
            };
            summarize(transactions, &per_type).map(|stats| (tl, stats))
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_euros(price: f64) -> u32 {
    price.ceil().max(0.0) as u32
}
