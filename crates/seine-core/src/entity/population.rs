//! Population: the biological state carrier for one stock.
//!
//! A population is a plain data carrier — parameter vectors, the age and
//! year axes, handles to its biological submodels, and the list of fleets
//! harvesting it. The only algorithm it owns is the log-to-natural transform
//! of its parameters on `Prepare`; every derived quantity is computed by an
//! evaluator and lives in the evaluator's store.

use crate::context::{IdAllocator, ObjectId};
use crate::math::Scalar;
use crate::params::ParameterVector;
use crate::submodel::{DepletionHandle, GrowthHandle, MaturityHandle, RecruitmentHandle};
use crate::vector::DenseVector;

#[derive(Debug, Clone)]
pub struct Population<T> {
    id: ObjectId,
    pub n_years: usize,
    pub n_ages: usize,
    /// Biological age of each age bin, length A. The last bin is the plus
    /// group.
    pub ages: Vec<f64>,
    /// Calendar label of each model year, length Y.
    pub years: Vec<f64>,

    /// Natural log of initial numbers at age, length A.
    pub log_init_naa: ParameterVector<T>,
    /// Natural log of natural mortality, length 1 or Y*A row-major
    /// (year, age).
    pub log_m: ParameterVector<T>,
    /// Natural log of the annual fishing-mortality multiplier, length 1 or Y.
    pub log_f_multiplier: ParameterVector<T>,
    /// Proportion female at age, length 0 (defaults to 0.5), 1, or A.
    pub proportion_female: ParameterVector<T>,

    // Natural-scale working values filled by prepare
    pub(crate) m: DenseVector<T>,
    pub(crate) f_multiplier: DenseVector<T>,
    pub(crate) proportion_female_at_age: DenseVector<T>,

    pub growth: GrowthHandle,
    pub maturity: MaturityHandle,
    pub recruitment: RecruitmentHandle,
    /// Only the surplus-production evaluator requires one.
    pub depletion: Option<DepletionHandle>,

    /// Ids of the fleets harvesting this population, in harvest order.
    pub fleets: Vec<ObjectId>,
}

impl<T: Scalar> Population<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ids: &mut IdAllocator,
        n_years: usize,
        ages: Vec<f64>,
        log_init_naa: ParameterVector<T>,
        log_m: ParameterVector<T>,
        log_f_multiplier: ParameterVector<T>,
        proportion_female: ParameterVector<T>,
        growth: GrowthHandle,
        maturity: MaturityHandle,
        recruitment: RecruitmentHandle,
    ) -> Self {
        let n_ages = ages.len();
        Self {
            id: ids.allocate(),
            n_years,
            n_ages,
            ages,
            years: (0..n_years).map(|y| y as f64).collect(),
            log_init_naa,
            log_m,
            log_f_multiplier,
            proportion_female,
            m: DenseVector::default(),
            f_multiplier: DenseVector::default(),
            proportion_female_at_age: DenseVector::default(),
            growth,
            maturity,
            recruitment,
            depletion: None,
            fleets: Vec::new(),
        }
    }

    pub fn with_depletion(mut self, depletion: DepletionHandle) -> Self {
        self.depletion = Some(depletion);
        self
    }

    pub fn with_fleets(mut self, fleets: Vec<ObjectId>) -> Self {
        self.fleets = fleets;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn n_fleets(&self) -> usize {
        self.fleets.len()
    }

    /// Natural mortality at folded index `y * A + a`.
    pub fn m(&self, i: usize) -> T {
        self.m[i]
    }

    /// Annual F multiplier for `year`.
    pub fn f_multiplier(&self, year: usize) -> T {
        self.f_multiplier[year]
    }

    /// Proportion female for age bin `a`.
    pub fn proportion_female_at_age(&self, a: usize) -> T {
        self.proportion_female_at_age[a]
    }

    /// Size the working vectors. Called once by the evaluator's Initialize.
    pub(crate) fn allocate(&mut self) {
        self.m = DenseVector::zeros(self.n_years * self.n_ages);
        self.f_multiplier = DenseVector::zeros(self.n_years);
        self.proportion_female_at_age = DenseVector::zeros(self.n_ages);
    }

    /// Transform log-scale parameters to natural scale and broadcast the
    /// proportion-female default.
    pub(crate) fn prepare(&mut self) {
        for a in 0..self.n_ages {
            self.proportion_female_at_age[a] = if self.proportion_female.is_empty() {
                T::constant(0.5)
            } else {
                self.proportion_female.force_scalar(a)
            };
        }
        if !self.log_m.is_empty() {
            for i in 0..self.n_years * self.n_ages {
                self.m[i] = self.log_m.force_scalar(i).exp();
            }
        }
        if !self.log_f_multiplier.is_empty() {
            for y in 0..self.n_years {
                self.f_multiplier[y] = self.log_f_multiplier.force_scalar(y).exp();
            }
        }
    }

    /// Visit this population's parameter vectors in registration order.
    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        let id = self.id;
        visit(id, "log_init_naa", &mut self.log_init_naa);
        visit(id, "log_m", &mut self.log_m);
        visit(id, "log_f_multiplier", &mut self.log_f_multiplier);
        visit(id, "proportion_female", &mut self.proportion_female);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EstimationMode;
    use crate::submodel::{GrowthHandle, MaturityHandle, RecruitmentHandle};

    fn tiny_population() -> Population<f64> {
        let mut ids = IdAllocator::new();
        let log_init_naa = ParameterVector::constant(&mut ids, &[6.9, 6.7]);
        let log_m = ParameterVector::constant(&mut ids, &[(0.2f64).ln()]);
        let log_fmult = ParameterVector::constant(&mut ids, &[0.0]);
        let pf = ParameterVector::empty(&mut ids);
        Population::new(
            &mut ids,
            3,
            vec![1.0, 2.0],
            log_init_naa,
            log_m,
            log_fmult,
            pf,
            GrowthHandle(0),
            MaturityHandle(0),
            RecruitmentHandle(0),
        )
    }

    #[test]
    fn test_prepare_broadcasts_scalar_m_over_year_age_grid() {
        let mut p = tiny_population();
        p.allocate();
        p.prepare();
        for i in 0..6 {
            assert!((p.m(i) - 0.2).abs() < 1e-14);
        }
        for y in 0..3 {
            assert!((p.f_multiplier(y) - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_prepare_defaults_proportion_female() {
        let mut p = tiny_population();
        p.allocate();
        p.prepare();
        assert_eq!(p.proportion_female_at_age(0), 0.5);
        assert_eq!(p.proportion_female_at_age(1), 0.5);
    }

    #[test]
    fn test_supplied_proportion_female_broadcasts() {
        let mut ids = IdAllocator::new();
        let mut p = tiny_population();
        p.proportion_female =
            ParameterVector::new(&mut ids, &[0.6], EstimationMode::Constant);
        p.allocate();
        p.prepare();
        assert_eq!(p.proportion_female_at_age(1), 0.6);
    }
}
