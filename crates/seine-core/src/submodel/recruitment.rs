//! Recruitment: expected numbers entering the population at age 0.
//!
//! The stock-recruit curve gives mean recruitment from spawning biomass; the
//! process form adds a log-scale deviation per year so the optimizer can fit
//! year-class strength. `log_expected_recruitment` is working state written
//! by the evaluator (the mean for year y lands at index y) and read back by
//! `evaluate_process`.

use crate::context::{IdAllocator, ObjectId};
use crate::math::Scalar;
use crate::params::{EstimationMode, ParameterVector};
use crate::vector::DenseVector;

/// Beverton-Holt stock-recruit curve with steepness parameterization.
///
/// With steepness `h`, unfished recruitment `R0`, and unfished spawning
/// biomass per recruit `phi0`:
///
/// `R(SB) = (0.8 R0 h SB) / (0.2 R0 phi0 (1 - h) + SB (h - 0.2))`
#[derive(Debug, Clone)]
pub struct BevertonHoltRecruitment<T> {
    id: ObjectId,
    pub steepness: ParameterVector<T>,
    pub log_rzero: ParameterVector<T>,
    /// Log-scale process deviations, length Y - 1. Empty means recruitment
    /// follows the curve exactly.
    pub log_devs: ParameterVector<T>,
    /// Log of mean recruitment recorded by the evaluator, length Y.
    pub log_expected_recruitment: DenseVector<T>,
}

impl<T: Scalar> BevertonHoltRecruitment<T> {
    pub fn new(ids: &mut IdAllocator, steepness: f64, rzero: f64) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            steepness: ParameterVector::new(ids, &[steepness], mode),
            log_rzero: ParameterVector::new(ids, &[rzero.ln()], mode),
            log_devs: ParameterVector::empty(ids),
            log_expected_recruitment: DenseVector::default(),
        }
    }

    pub fn with_log_devs(mut self, ids: &mut IdAllocator, devs: &[f64], mode: EstimationMode) -> Self {
        self.log_devs = ParameterVector::new(ids, devs, mode);
        self
    }

    pub fn evaluate_mean(&self, spawning_biomass: T, phi0: T) -> T {
        let h = self.steepness.value(0);
        let rzero = self.log_rzero.value(0).exp();
        let c08 = T::constant(0.8);
        let c02 = T::constant(0.2);
        (c08 * rzero * h * spawning_biomass)
            / (c02 * rzero * phi0 * (T::one() - h) + spawning_biomass * (h - c02))
    }

    pub fn evaluate_process(&self, year: usize) -> T {
        if self.log_devs.is_empty() {
            self.log_expected_recruitment[year]
        } else {
            self.log_expected_recruitment[year] + self.log_devs.value(year)
        }
    }
}

/// The recruitment family.
#[derive(Debug, Clone)]
pub enum Recruitment<T> {
    BevertonHolt(BevertonHoltRecruitment<T>),
}

impl<T: Scalar> Recruitment<T> {
    pub fn id(&self) -> ObjectId {
        match self {
            Recruitment::BevertonHolt(r) => r.id,
        }
    }

    /// Mean recruitment on the stock-recruit curve.
    pub fn evaluate_mean(&self, spawning_biomass: T, phi0: T) -> T {
        match self {
            Recruitment::BevertonHolt(r) => r.evaluate_mean(spawning_biomass, phi0),
        }
    }

    /// Log-scale expected recruitment for `year`, including any process
    /// deviation.
    pub fn evaluate_process(&self, year: usize) -> T {
        match self {
            Recruitment::BevertonHolt(r) => r.evaluate_process(year),
        }
    }

    /// `log(R0)`, consumed by the unfished-numbers recursion.
    pub fn log_rzero(&self) -> T {
        match self {
            Recruitment::BevertonHolt(r) => r.log_rzero.value(0),
        }
    }

    /// Record the log of mean recruitment for `year`.
    pub fn record_log_expected(&mut self, year: usize, value: T) {
        match self {
            Recruitment::BevertonHolt(r) => r.log_expected_recruitment[year] = value,
        }
    }

    /// Size the working vector; called once at build time.
    pub(crate) fn allocate(&mut self, n_years: usize) {
        match self {
            Recruitment::BevertonHolt(r) => {
                r.log_expected_recruitment = DenseVector::zeros(n_years);
            }
        }
    }

    pub fn prepare(&mut self) {
        match self {
            Recruitment::BevertonHolt(r) => r.log_expected_recruitment.reset(),
        }
    }

    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        match self {
            Recruitment::BevertonHolt(r) => {
                let id = r.id;
                visit(id, "steepness", &mut r.steepness);
                visit(id, "log_rzero", &mut r.log_rzero);
                visit(id, "log_devs", &mut r.log_devs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_recruitment_at_unfished_equilibrium() {
        let mut ids = IdAllocator::new();
        let r = BevertonHoltRecruitment::<f64>::new(&mut ids, 0.75, 1000.0);
        // At SB = R0 * phi0 the curve returns exactly R0.
        let phi0 = 4.2;
        let sb0 = 1000.0 * phi0;
        assert!((r.evaluate_mean(sb0, phi0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_recruitment_is_increasing_and_saturating() {
        let mut ids = IdAllocator::new();
        let r = BevertonHoltRecruitment::<f64>::new(&mut ids, 0.75, 1000.0);
        let phi0 = 4.2;
        let low = r.evaluate_mean(100.0, phi0);
        let mid = r.evaluate_mean(1000.0, phi0);
        let high = r.evaluate_mean(100_000.0, phi0);
        assert!(low < mid && mid < high);
        // asymptote: 0.8 R0 h / (h - 0.2)
        let asymptote = 0.8 * 1000.0 * 0.75 / (0.75 - 0.2);
        assert!(high < asymptote);
        assert!((r.evaluate_mean(1e12, phi0) - asymptote).abs() / asymptote < 1e-6);
    }

    #[test]
    fn test_process_with_and_without_deviations() {
        let mut ids = IdAllocator::new();
        let mut plain = Recruitment::BevertonHolt(BevertonHoltRecruitment::<f64>::new(
            &mut ids, 0.75, 1000.0,
        ));
        plain.allocate(5);
        plain.record_log_expected(2, 6.9);
        assert_eq!(plain.evaluate_process(2), 6.9);

        let mut with_devs = Recruitment::BevertonHolt(
            BevertonHoltRecruitment::<f64>::new(&mut ids, 0.75, 1000.0).with_log_devs(
                &mut ids,
                &[0.0, 0.1, -0.2, 0.0],
                EstimationMode::FixedEffects,
            ),
        );
        with_devs.allocate(5);
        with_devs.record_log_expected(1, 6.9);
        assert!((with_devs.evaluate_process(1) - 7.0).abs() < 1e-12);
    }
}
