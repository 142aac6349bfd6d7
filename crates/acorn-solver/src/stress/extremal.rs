//! Extremal element selection by percentile.
//!
//! The percentile is the share of elements considered non-extreme; the
//! remaining `round(N * (100 - p) / 100)` most compressive and most tensile
//! elements form the two extremal sets.

use acorn_model::units::kn_per_cm2_to_mpa;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{ElementStressRecord, StressCatalog};
use crate::error::{Result, SolverError};

/// Percentile in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentile(f64);

impl Percentile {
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&value) {
            return Err(SolverError::PercentileOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Size of each extremal set for a catalog of `n` elements. Halves
    /// round to even.
    pub fn extreme_count(self, n: usize) -> usize {
        (n as f64 * (100.0 - self.0) / 100.0).round_ties_even() as usize
    }
}

impl Default for Percentile {
    fn default() -> Self {
        Self(95.0)
    }
}

impl TryFrom<f64> for Percentile {
    type Error = SolverError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Percentile> for f64 {
    fn from(p: Percentile) -> f64 {
        p.0
    }
}

/// Most compressive and most tensile elements, most extreme first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtremalSelection {
    pub compression: Vec<ElementStressRecord>,
    pub tension: Vec<ElementStressRecord>,
}

/// Reported extremal values in MPa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressSummary {
    pub max_compression: f64,
    /// Least compressive value still inside the compression set
    pub max_compression_at_percentile: f64,
    pub max_tension: f64,
    /// Least tensile value still inside the tension set
    pub max_tension_at_percentile: f64,
}

impl ExtremalSelection {
    pub fn is_empty(&self) -> bool {
        self.compression.is_empty() && self.tension.is_empty()
    }

    /// Summary scalars converted to MPa.
    pub fn summary(&self) -> Result<StressSummary> {
        let (Some(c_first), Some(c_last)) = (self.compression.first(), self.compression.last())
        else {
            return Err(SolverError::EmptyResultSet);
        };
        let (Some(t_first), Some(t_last)) = (self.tension.first(), self.tension.last()) else {
            return Err(SolverError::EmptyResultSet);
        };
        Ok(StressSummary {
            max_compression: kn_per_cm2_to_mpa(c_first.max_compression()),
            max_compression_at_percentile: kn_per_cm2_to_mpa(c_last.max_compression()),
            max_tension: kn_per_cm2_to_mpa(t_first.max_tension()),
            max_tension_at_percentile: kn_per_cm2_to_mpa(t_last.max_tension()),
        })
    }
}

/// Splits off the extremal elements of `catalog`. Ties keep catalog order.
pub fn select_extremes(catalog: &StressCatalog, percentile: Percentile) -> ExtremalSelection {
    let count = percentile.extreme_count(catalog.len());
    if count == 0 {
        debug!(percentile = percentile.value(), "no extremal elements selected");
        return ExtremalSelection::default();
    }

    let mut compression = catalog.records.clone();
    compression.sort_by(|a, b| a.max_compression().total_cmp(&b.max_compression()));
    compression.truncate(count);

    let mut tension = catalog.records.clone();
    tension.sort_by(|a, b| b.max_tension().total_cmp(&a.max_tension()));
    tension.truncate(count);

    debug!(
        count,
        percentile = percentile.value(),
        elements = catalog.len(),
        "selected extremal elements"
    );
    ExtremalSelection {
        compression,
        tension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_is_range_checked() {
        assert!(Percentile::new(-0.1).is_err());
        assert!(Percentile::new(100.1).is_err());
        assert!(matches!(
            Percentile::new(f64::NAN),
            Err(SolverError::PercentileOutOfRange(_))
        ));
        assert_eq!(Percentile::default().value(), 95.0);
    }

    #[test]
    fn extreme_count_rounds_half_to_even() {
        let p = Percentile::new(95.0).expect("valid");
        assert_eq!(p.extreme_count(100), 5);
        assert_eq!(p.extreme_count(10), 0);
        assert_eq!(p.extreme_count(30), 2);
        assert_eq!(Percentile::new(100.0).expect("valid").extreme_count(1000), 0);
        assert_eq!(Percentile::new(0.0).expect("valid").extreme_count(7), 7);
    }

    #[test]
    fn percentile_deserializes_with_validation() {
        let p: Percentile = serde_json::from_str("90.0").expect("valid");
        assert_eq!(p.value(), 90.0);
        assert!(serde_json::from_str::<Percentile>("120.0").is_err());
    }

    #[test]
    fn empty_selection_has_no_summary() {
        let selection = ExtremalSelection::default();
        assert!(matches!(selection.summary(), Err(SolverError::EmptyResultSet)));
    }
}
