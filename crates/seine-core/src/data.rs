//! Observed data streams.
//!
//! Observations are plain `f64` — they are inputs to the likelihood layer,
//! never differentiated through. Missing values inside a present stream are
//! marked with a sentinel (`na_value`, conventionally -999); a stream that
//! is absent altogether is simply not attached to the fleet.

use crate::error::BuildError;

/// Default missing-value sentinel.
pub const DEFAULT_NA_VALUE: f64 = -999.0;

/// A per-year observation series (landings or index), length Y.
#[derive(Debug, Clone)]
pub struct ObservedSeries {
    values: Vec<f64>,
    na_value: f64,
}

impl ObservedSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, na_value: DEFAULT_NA_VALUE }
    }

    pub fn with_na_value(values: Vec<f64>, na_value: f64) -> Self {
        Self { values, na_value }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn is_na(&self, i: usize) -> bool {
        self.values[i] == self.na_value
    }
}

/// A year-by-bin observation matrix (age or length composition), row-major
/// by year.
#[derive(Debug, Clone)]
pub struct ObservedMatrix {
    values: Vec<f64>,
    n_years: usize,
    n_bins: usize,
    na_value: f64,
}

impl ObservedMatrix {
    /// Fails when the flat data does not factor into `n_years * n_bins`.
    pub fn new(values: Vec<f64>, n_years: usize, n_bins: usize) -> Result<Self, BuildError> {
        if values.len() != n_years * n_bins {
            return Err(BuildError::DimensionMismatch {
                entity: "observed composition matrix".into(),
                key: "values".into(),
                expected: n_years * n_bins,
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            n_years,
            n_bins,
            na_value: DEFAULT_NA_VALUE,
        })
    }

    pub fn n_years(&self) -> usize {
        self.n_years
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn at(&self, year: usize, bin: usize) -> f64 {
        self.values[year * self.n_bins + bin]
    }

    pub fn is_na(&self, year: usize, bin: usize) -> bool {
        self.values[year * self.n_bins + bin] == self.na_value
    }

    /// Sum over the non-missing entries of one year row.
    pub fn row_observed_sum(&self, year: usize) -> f64 {
        (0..self.n_bins)
            .filter(|&b| !self.is_na(year, b))
            .map(|b| self.at(year, b))
            .sum()
    }

    /// Whether one year row has at least one non-missing entry.
    pub fn row_has_observations(&self, year: usize) -> bool {
        (0..self.n_bins).any(|b| !self.is_na(year, b))
    }
}

/// Which units a fleet's landings or index observations are recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataUnits {
    Number,
    #[default]
    Weight,
}

impl DataUnits {
    /// "number" selects numbers; any other string selects weight.
    pub fn from_flag(flag: &str) -> Self {
        if flag == "number" {
            DataUnits::Number
        } else {
            DataUnits::Weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_na_sentinel() {
        let s = ObservedSeries::new(vec![10.0, -999.0, 12.0]);
        assert!(!s.is_na(0));
        assert!(s.is_na(1));
        assert_eq!(s.at(2), 12.0);
    }

    #[test]
    fn test_matrix_row_sums_skip_na() {
        let m = ObservedMatrix::new(vec![1.0, -999.0, 3.0, -999.0, -999.0, -999.0], 2, 3).unwrap();
        assert!((m.row_observed_sum(0) - 4.0).abs() < 1e-12);
        assert!(m.row_has_observations(0));
        assert_eq!(m.row_observed_sum(1), 0.0);
        assert!(!m.row_has_observations(1));
    }

    #[test]
    fn test_matrix_dimension_check() {
        assert!(ObservedMatrix::new(vec![1.0, 2.0, 3.0], 2, 2).is_err());
    }

    #[test]
    fn test_units_flag() {
        assert_eq!(DataUnits::from_flag("number"), DataUnits::Number);
        assert_eq!(DataUnits::from_flag("weight"), DataUnits::Weight);
        assert_eq!(DataUnits::from_flag("biomass"), DataUnits::Weight);
    }
}
