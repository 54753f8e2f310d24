//! Depletion: the biomass-dynamics production function.
//!
//! The state variable is depletion, biomass as a fraction of carrying
//! capacity. The submodel owns the whole depletion parameter block: the
//! production parameters on log scale, the initial condition, and the
//! year-indexed `log_depletion` series that the outer layer can treat as a
//! random effect around the expected process.

use crate::context::{IdAllocator, ObjectId};
use crate::math::Scalar;
use crate::params::{EstimationMode, ParameterVector};
use crate::vector::DenseVector;

/// Pella-Tomlinson production.
///
/// `d_t = d_{t-1} + (r / (m - 1)) d_{t-1} (1 - d_{t-1}^{m-1}) - C_{t-1} / K`
///
/// `m` controls where surplus production peaks (m = 2 recovers Schaefer).
#[derive(Debug, Clone)]
pub struct PellaTomlinsonDepletion<T> {
    id: ObjectId,
    pub log_r: ParameterVector<T>,
    pub log_k: ParameterVector<T>,
    pub log_m: ParameterVector<T>,
    pub log_init_depletion: ParameterVector<T>,
    /// Realized log-depletion series, length Y + 1; estimable as random
    /// effects around `log_expected_depletion`.
    pub log_depletion: ParameterVector<T>,
    /// Expectation of the depletion process, length Y + 1; written by the
    /// surplus-production evaluator.
    pub log_expected_depletion: DenseVector<T>,
    // Natural-scale working values filled by prepare
    r: T,
    k: T,
    m: T,
    depletion: DenseVector<T>,
}

impl<T: Scalar> PellaTomlinsonDepletion<T> {
    pub fn new(
        ids: &mut IdAllocator,
        r: f64,
        k: f64,
        m: f64,
        init_depletion: f64,
        log_depletion: &[f64],
    ) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            log_r: ParameterVector::new(ids, &[r.ln()], mode),
            log_k: ParameterVector::new(ids, &[k.ln()], mode),
            log_m: ParameterVector::new(ids, &[m.ln()], mode),
            log_init_depletion: ParameterVector::new(ids, &[init_depletion.ln()], mode),
            log_depletion: ParameterVector::new(ids, log_depletion, mode),
            log_expected_depletion: DenseVector::default(),
            r: T::zero(),
            k: T::zero(),
            m: T::zero(),
            depletion: DenseVector::default(),
        }
    }

    /// Transform the log-scale parameters to natural scale.
    pub fn prepare(&mut self) {
        self.r = self.log_r.value(0).exp();
        self.k = self.log_k.value(0).exp();
        self.m = self.log_m.value(0).exp();
        self.depletion = (0..self.log_depletion.len())
            .map(|i| self.log_depletion.value(i).exp())
            .collect();
        self.reset_log_expected_depletion();
    }

    fn reset_log_expected_depletion(&mut self) {
        if self.log_expected_depletion.len() != self.log_depletion.len() {
            self.log_expected_depletion = DenseVector::zeros(self.log_depletion.len());
        } else {
            self.log_expected_depletion.reset();
        }
    }

    pub fn evaluate_mean(&self, depletion_prev: T, catch_prev: T) -> T {
        let one = T::one();
        depletion_prev
            + (self.r / (self.m - one)) * depletion_prev * (one - depletion_prev.powf(self.m - one))
            - catch_prev / self.k
    }

    pub fn r(&self) -> T {
        self.r
    }

    pub fn k(&self) -> T {
        self.k
    }

    pub fn m(&self) -> T {
        self.m
    }

    /// Realized depletion at `year` (natural scale of `log_depletion`).
    pub fn depletion(&self, year: usize) -> T {
        self.depletion[year]
    }
}

/// The depletion family.
#[derive(Debug, Clone)]
pub enum Depletion<T> {
    PellaTomlinson(PellaTomlinsonDepletion<T>),
}

impl<T: Scalar> Depletion<T> {
    pub fn id(&self) -> ObjectId {
        match self {
            Depletion::PellaTomlinson(d) => d.id,
        }
    }

    pub fn evaluate_mean(&self, depletion_prev: T, catch_prev: T) -> T {
        match self {
            Depletion::PellaTomlinson(d) => d.evaluate_mean(depletion_prev, catch_prev),
        }
    }

    pub fn prepare(&mut self) {
        match self {
            Depletion::PellaTomlinson(d) => d.prepare(),
        }
    }

    pub fn inner(&self) -> &PellaTomlinsonDepletion<T> {
        match self {
            Depletion::PellaTomlinson(d) => d,
        }
    }

    pub fn inner_mut(&mut self) -> &mut PellaTomlinsonDepletion<T> {
        match self {
            Depletion::PellaTomlinson(d) => d,
        }
    }

    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        match self {
            Depletion::PellaTomlinson(d) => {
                let id = d.id;
                visit(id, "log_r", &mut d.log_r);
                visit(id, "log_k", &mut d.log_k);
                visit(id, "log_m", &mut d.log_m);
                visit(id, "log_init_depletion", &mut d.log_init_depletion);
                visit(id, "log_depletion", &mut d.log_depletion);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pella_tomlinson_step() {
        let mut ids = IdAllocator::new();
        let mut d =
            PellaTomlinsonDepletion::<f64>::new(&mut ids, 0.2, 645.0, 2.0, 0.9, &[0.0, 0.0]);
        d.prepare();
        // d = 0.88, C = 10: 0.88 + 0.2*0.88*(1-0.88) - 10/645
        let next = d.evaluate_mean(0.88, 10.0);
        assert!((next - 0.8856161).abs() < 1e-6);
    }

    #[test]
    fn test_schaefer_equilibrium_is_fixed_point() {
        let mut ids = IdAllocator::new();
        let mut d = PellaTomlinsonDepletion::<f64>::new(&mut ids, 0.2, 1000.0, 2.0, 1.0, &[0.0]);
        d.prepare();
        // with no catch, d = 1 is the unfished equilibrium
        assert!((d.evaluate_mean(1.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_round_trips_log_parameters() {
        let mut ids = IdAllocator::new();
        let mut d =
            PellaTomlinsonDepletion::<f64>::new(&mut ids, 0.2, 645.0, 2.0, 0.9, &[-0.1, -0.2]);
        d.prepare();
        assert!((d.r() - 0.2).abs() < 1e-14);
        assert!((d.k() - 645.0).abs() < 1e-12);
        assert!((d.m() - 2.0).abs() < 1e-14);
        assert!((d.depletion(1) - (-0.2f64).exp()).abs() < 1e-14);
    }
}
