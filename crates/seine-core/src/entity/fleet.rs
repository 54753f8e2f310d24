//! Fleet: one source of removals or observations.
//!
//! A "fleet" covers both extractive fisheries and surveys: a survey is a
//! fleet with an index series and no landings. Which observation streams are
//! attached decides how the fleet participates — a fleet with no landings
//! reference contributes compositions from its index and is excluded from
//! landings totals.

use crate::context::{IdAllocator, ObjectId};
use crate::data::{DataUnits, ObservedMatrix, ObservedSeries};
use crate::math::Scalar;
use crate::params::{EstimationMode, Parameter, ParameterVector};
use crate::submodel::SelectivityHandle;
use crate::vector::DenseVector;

#[derive(Debug, Clone)]
pub struct Fleet<T> {
    id: ObjectId,
    pub n_years: usize,
    pub n_ages: usize,
    /// Number of length bins; 0 when the fleet has no length structure.
    pub n_lengths: usize,

    pub selectivity: SelectivityHandle,

    /// Natural log of annual fishing mortality, length 1 or Y.
    pub log_fmort: ParameterVector<T>,
    /// Natural log of catchability, length 0 (defaults to 0), 1, or Y.
    pub log_q: ParameterVector<T>,

    // Natural-scale working values filled by prepare
    pub(crate) fmort: DenseVector<T>,
    pub(crate) q: DenseVector<T>,

    /// Age-to-length conversion, length A*L row-major (age, length).
    pub age_to_length_conversion: DenseVector<f64>,

    pub observed_landings: Option<ObservedSeries>,
    pub observed_index: Option<ObservedSeries>,
    pub observed_agecomp: Option<ObservedMatrix>,
    pub observed_lengthcomp: Option<ObservedMatrix>,

    pub landings_units: DataUnits,
    pub index_units: DataUnits,
}

impl<T: Scalar> Fleet<T> {
    pub fn new(
        ids: &mut IdAllocator,
        n_years: usize,
        n_ages: usize,
        selectivity: SelectivityHandle,
        log_fmort: ParameterVector<T>,
        log_q: ParameterVector<T>,
    ) -> Self {
        Self {
            id: ids.allocate(),
            n_years,
            n_ages,
            n_lengths: 0,
            selectivity,
            log_fmort,
            log_q,
            fmort: DenseVector::default(),
            q: DenseVector::default(),
            age_to_length_conversion: DenseVector::default(),
            observed_landings: None,
            observed_index: None,
            observed_agecomp: None,
            observed_lengthcomp: None,
            landings_units: DataUnits::Weight,
            index_units: DataUnits::Weight,
        }
    }

    /// Attach length structure: `conversion` is A*L row-major (age, length).
    pub fn with_length_bins(mut self, n_lengths: usize, conversion: Vec<f64>) -> Self {
        self.n_lengths = n_lengths;
        self.age_to_length_conversion = DenseVector::from_vec(conversion);
        self
    }

    pub fn with_observed_landings(mut self, series: ObservedSeries, units: DataUnits) -> Self {
        self.observed_landings = Some(series);
        self.landings_units = units;
        self
    }

    pub fn with_observed_index(mut self, series: ObservedSeries, units: DataUnits) -> Self {
        self.observed_index = Some(series);
        self.index_units = units;
        self
    }

    pub fn with_observed_agecomp(mut self, matrix: ObservedMatrix) -> Self {
        self.observed_agecomp = Some(matrix);
        self
    }

    pub fn with_observed_lengthcomp(mut self, matrix: ObservedMatrix) -> Self {
        self.observed_lengthcomp = Some(matrix);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether compositions come from landings (true) or the index (false).
    pub fn has_landings_data(&self) -> bool {
        self.observed_landings.is_some()
    }

    /// Fishing mortality for `year`.
    pub fn fmort(&self, year: usize) -> T {
        self.fmort[year]
    }

    /// Catchability with length-1 broadcasting over years.
    pub fn q(&self, year: usize) -> T {
        self.q.force_scalar(year)
    }

    /// Default catchability to 1 (log q = 0) when none was supplied, and
    /// size the working vectors. Called once by the evaluator's Initialize.
    pub(crate) fn allocate(&mut self) {
        if self.log_q.is_empty() {
            self.log_q.push(Parameter::new(0.0, EstimationMode::Constant));
        }
        self.q = DenseVector::zeros(self.log_q.len());
        self.fmort = DenseVector::zeros(self.n_years);
    }

    /// Transform log-scale parameters to natural scale.
    pub(crate) fn prepare(&mut self) {
        for i in 0..self.log_q.len() {
            self.q[i] = self.log_q.value(i).exp();
        }
        for y in 0..self.n_years {
            self.fmort[y] = self.log_fmort.force_scalar(y).exp();
        }
    }

    /// Visit this fleet's parameter vectors in registration order.
    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        let id = self.id;
        visit(id, "log_fmort", &mut self.log_fmort);
        visit(id, "log_q", &mut self.log_q);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_fleet() -> Fleet<f64> {
        let mut ids = IdAllocator::new();
        let log_fmort = ParameterVector::constant(&mut ids, &[(0.1f64).ln()]);
        let log_q = ParameterVector::empty(&mut ids);
        Fleet::new(&mut ids, 4, 3, SelectivityHandle(0), log_fmort, log_q)
    }

    #[test]
    fn test_missing_catchability_defaults_to_one() {
        let mut f = tiny_fleet();
        f.allocate();
        f.prepare();
        assert!((f.q(0) - 1.0).abs() < 1e-14);
        assert!((f.q(3) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_fmort_broadcasts_scalar_over_years() {
        let mut f = tiny_fleet();
        f.allocate();
        f.prepare();
        for y in 0..4 {
            assert!((f.fmort(y) - 0.1).abs() < 1e-14);
        }
    }

    #[test]
    fn test_landings_presence_flag() {
        let f = tiny_fleet();
        assert!(!f.has_landings_data());
        let f = tiny_fleet().with_observed_landings(
            ObservedSeries::new(vec![1.0, 2.0, 3.0, 4.0]),
            DataUnits::Weight,
        );
        assert!(f.has_landings_data());
    }
}
