//! Growth: weight at age.
//!
//! Two variants. Empirical weight-at-age is a direct tabulation (the common
//! case when an assessment is handed weights from a sampling program). Von
//! Bertalanffy derives weight through a length curve and a length-weight
//! power relationship, and additionally produces the length distribution
//! products (mean and sd of length at age) that the age-length key is built
//! from.

use crate::context::{IdAllocator, ObjectId};
use crate::math::{self, Scalar};
use crate::params::{EstimationMode, ParameterVector};
use crate::vector::DenseVector;

/// Weight at age tabulated from equal-length age and weight sequences.
///
/// Lookup is by exact age key; an age that was never tabulated weighs zero.
#[derive(Debug, Clone)]
pub struct EmpiricalWeightAtAge<T> {
    id: ObjectId,
    ages: Vec<f64>,
    weights: DenseVector<T>,
}

impl<T: Scalar> EmpiricalWeightAtAge<T> {
    pub fn new(ids: &mut IdAllocator, ages: Vec<f64>, weights: &[f64]) -> Self {
        assert_eq!(ages.len(), weights.len(), "age and weight sequences must match");
        Self {
            id: ids.allocate(),
            ages,
            weights: DenseVector::from_f64s(weights),
        }
    }

    pub fn weight_at_age(&self, age: f64) -> T {
        match self.ages.iter().position(|&a| a == age) {
            Some(i) => self.weights[i],
            None => T::zero(),
        }
    }
}

/// Cached growth products in (year, age, sex) space, row-major
/// `(y * n_ages + a) * n_sexes + s`.
#[derive(Debug, Clone)]
pub struct GrowthProducts<T> {
    pub n_years: usize,
    pub n_ages: usize,
    pub n_sexes: usize,
    pub mean_length_at_age: DenseVector<T>,
    pub sd_length_at_age: DenseVector<T>,
    pub mean_weight_at_age: DenseVector<T>,
}

impl<T> Default for GrowthProducts<T> {
    fn default() -> Self {
        Self {
            n_years: 0,
            n_ages: 0,
            n_sexes: 0,
            mean_length_at_age: DenseVector::default(),
            sd_length_at_age: DenseVector::default(),
            mean_weight_at_age: DenseVector::default(),
        }
    }
}

impl<T: Scalar> GrowthProducts<T> {
    fn resize(&mut self, n_years: usize, n_ages: usize, n_sexes: usize) {
        let n = n_years * n_ages * n_sexes;
        self.n_years = n_years;
        self.n_ages = n_ages;
        self.n_sexes = n_sexes;
        self.mean_length_at_age = DenseVector::zeros(n);
        self.sd_length_at_age = DenseVector::zeros(n);
        self.mean_weight_at_age = DenseVector::zeros(n);
    }

    pub fn index(&self, year: usize, age: usize, sex: usize) -> usize {
        (year * self.n_ages + age) * self.n_sexes + sex
    }
}

/// Von Bertalanffy growth parameterized by length at two reference ages,
/// with allometric length-weight conversion.
///
/// `L(a) = L1 + (L2 - L1) * (1 - exp(-K (a - A1))) / (1 - exp(-K (A2 - A1)))`
/// and `W(a) = a_wl * L(a)^b_wl`. The reference ages are structural
/// constants; when they coincide the curve degenerates and `L(a) = L1`.
#[derive(Debug, Clone)]
pub struct VonBertalanffyGrowth<T> {
    id: ObjectId,
    pub length_at_ref_age_1: ParameterVector<T>,
    pub length_at_ref_age_2: ParameterVector<T>,
    pub growth_coefficient_k: ParameterVector<T>,
    pub length_weight_a: ParameterVector<T>,
    pub length_weight_b: ParameterVector<T>,
    pub sd_at_ref_age_1: ParameterVector<T>,
    pub sd_at_ref_age_2: ParameterVector<T>,
    ref_age_1: f64,
    ref_age_2: f64,
    /// Biological age of the first age bin (populations often start at 1).
    age_offset: f64,
    products: GrowthProducts<T>,
    /// Primal snapshot of the parameters the cache was last filled from.
    cached_at: Vec<f64>,
}

impl<T: Scalar> VonBertalanffyGrowth<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ids: &mut IdAllocator,
        length_at_ref_age_1: f64,
        length_at_ref_age_2: f64,
        growth_coefficient_k: f64,
        ref_age_1: f64,
        ref_age_2: f64,
        length_weight_a: f64,
        length_weight_b: f64,
    ) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            length_at_ref_age_1: ParameterVector::new(ids, &[length_at_ref_age_1], mode),
            length_at_ref_age_2: ParameterVector::new(ids, &[length_at_ref_age_2], mode),
            growth_coefficient_k: ParameterVector::new(ids, &[growth_coefficient_k], mode),
            length_weight_a: ParameterVector::new(ids, &[length_weight_a], mode),
            length_weight_b: ParameterVector::new(ids, &[length_weight_b], mode),
            sd_at_ref_age_1: ParameterVector::new(ids, &[3.0], mode),
            sd_at_ref_age_2: ParameterVector::new(ids, &[7.0], mode),
            ref_age_1,
            ref_age_2,
            age_offset: 0.0,
            products: GrowthProducts::default(),
            cached_at: Vec::new(),
        }
    }

    /// Declare the (year, age, sex) grid the products are cached over.
    pub fn with_grid(mut self, n_years: usize, n_ages: usize, n_sexes: usize) -> Self {
        self.products.resize(n_years, n_ages, n_sexes);
        self
    }

    /// Biological age of age bin 0.
    pub fn with_age_offset(mut self, offset: f64) -> Self {
        self.age_offset = offset;
        self
    }

    /// Mean length at (biological) age.
    pub fn length_at_age(&self, age: f64) -> T {
        let l1 = self.length_at_ref_age_1.value(0);
        if self.ref_age_1 == self.ref_age_2 {
            return l1;
        }
        let l2 = self.length_at_ref_age_2.value(0);
        let k = self.growth_coefficient_k.value(0);
        let denom = T::one() - (-k * T::constant(self.ref_age_2 - self.ref_age_1)).exp();
        let numer = T::one() - (-k * (T::constant(age) - T::constant(self.ref_age_1))).exp();
        l1 + (l2 - l1) * numer / denom
    }

    /// Weight at (biological) age through the length-weight power curve.
    pub fn weight_at_age(&self, age: f64) -> T {
        let length = self.length_at_age(age);
        self.length_weight_a.value(0) * length.powf(self.length_weight_b.value(0))
    }

    /// Sd of length at age: linear in mean length between the two reference
    /// ages, with the length span kept away from zero so the slope stays
    /// finite and differentiable.
    pub fn sd_length_at_age(&self, age: f64) -> T {
        let sd1 = self.sd_at_ref_age_1.value(0);
        let sd2 = self.sd_at_ref_age_2.value(0);
        let laa_min = self.length_at_age(self.ref_age_1);
        let laa_max = self.length_at_age(self.ref_age_2);
        let span = math::smooth_max(math::smooth_abs(laa_max - laa_min), T::constant(1e-8));
        let slope = (sd2 - sd1) / span;
        sd1 + slope * (self.length_at_age(age) - laa_min)
    }

    /// Refill the products cache if any parameter moved since the last fill.
    pub fn prepare(&mut self) {
        if self.products.n_ages == 0 {
            return;
        }
        let snapshot = self.parameter_snapshot();
        if snapshot == self.cached_at {
            return;
        }
        for y in 0..self.products.n_years {
            for a in 0..self.products.n_ages {
                for s in 0..self.products.n_sexes {
                    let age = a as f64 + self.age_offset;
                    let i = self.products.index(y, a, s);
                    self.products.mean_length_at_age[i] = self.length_at_age(age);
                    self.products.sd_length_at_age[i] = self.sd_length_at_age(age);
                    self.products.mean_weight_at_age[i] = self.weight_at_age(age);
                }
            }
        }
        self.cached_at = snapshot;
    }

    pub fn products(&self) -> &GrowthProducts<T> {
        &self.products
    }

    /// Age-length key: `P(length bin l | age a)` over the supplied bin
    /// midpoints, row-major (age, length). Bin edges are midpoint +- 0.5,
    /// probabilities from the differentiable normal CDF over the cached
    /// year-0, sex-0 length distribution.
    pub fn age_length_key(&self, length_bins: &[f64]) -> DenseVector<T> {
        let n_ages = self.products.n_ages;
        let mut alk = DenseVector::zeros(n_ages * length_bins.len());
        for a in 0..n_ages {
            let i = self.products.index(0, a, 0);
            let mean = self.products.mean_length_at_age[i];
            let sd = self.products.sd_length_at_age[i];
            for (l, &mid) in length_bins.iter().enumerate() {
                let hi = math::normal_cdf(T::constant(mid + 0.5), mean, sd);
                let lo = math::normal_cdf(T::constant(mid - 0.5), mean, sd);
                alk[a * length_bins.len() + l] = hi - lo;
            }
        }
        alk
    }

    fn parameter_snapshot(&self) -> Vec<f64> {
        [
            &self.length_at_ref_age_1,
            &self.length_at_ref_age_2,
            &self.growth_coefficient_k,
            &self.length_weight_a,
            &self.length_weight_b,
            &self.sd_at_ref_age_1,
            &self.sd_at_ref_age_2,
        ]
        .iter()
        .map(|p| p.value(0).value())
        .collect()
    }
}

/// The growth family.
#[derive(Debug, Clone)]
pub enum Growth<T> {
    Empirical(EmpiricalWeightAtAge<T>),
    VonBertalanffy(VonBertalanffyGrowth<T>),
}

impl<T: Scalar> Growth<T> {
    pub fn id(&self) -> ObjectId {
        match self {
            Growth::Empirical(g) => g.id,
            Growth::VonBertalanffy(g) => g.id,
        }
    }

    pub fn weight_at_age(&self, age: f64) -> T {
        match self {
            Growth::Empirical(g) => g.weight_at_age(age),
            Growth::VonBertalanffy(g) => g.weight_at_age(age),
        }
    }

    pub fn prepare(&mut self) {
        match self {
            Growth::Empirical(_) => {}
            Growth::VonBertalanffy(g) => g.prepare(),
        }
    }

    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        match self {
            Growth::Empirical(_) => {}
            Growth::VonBertalanffy(g) => {
                let id = g.id;
                visit(id, "length_at_ref_age_1", &mut g.length_at_ref_age_1);
                visit(id, "length_at_ref_age_2", &mut g.length_at_ref_age_2);
                visit(id, "growth_coefficient_k", &mut g.growth_coefficient_k);
                visit(id, "length_weight_a", &mut g.length_weight_a);
                visit(id, "length_weight_b", &mut g.length_weight_b);
                visit(id, "sd_at_ref_age_1", &mut g.sd_at_ref_age_1);
                visit(id, "sd_at_ref_age_2", &mut g.sd_at_ref_age_2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vb(ids: &mut IdAllocator) -> VonBertalanffyGrowth<f64> {
        // L1 = 20 at age 1, L2 = 80 at age 10, K = 0.3, W = 1e-5 * L^3
        VonBertalanffyGrowth::new(ids, 20.0, 80.0, 0.3, 1.0, 10.0, 1e-5, 3.0)
            .with_grid(1, 10, 1)
            .with_age_offset(1.0)
    }

    #[test]
    fn test_empirical_lookup_and_missing_age() {
        let mut ids = IdAllocator::new();
        let g = EmpiricalWeightAtAge::<f64>::new(
            &mut ids,
            vec![1.0, 2.0, 3.0, 4.0],
            &[1.0, 2.0, 3.0, 4.0],
        );
        assert_eq!(g.weight_at_age(3.0), 3.0);
        assert_eq!(g.weight_at_age(7.0), 0.0);
    }

    #[test]
    fn test_vb_passes_through_reference_lengths() {
        let mut ids = IdAllocator::new();
        let g = vb(&mut ids);
        assert!((g.length_at_age(1.0) - 20.0).abs() < 1e-12);
        assert!((g.length_at_age(10.0) - 80.0).abs() < 1e-12);
        // monotone increasing in between
        assert!(g.length_at_age(5.0) > 20.0);
        assert!(g.length_at_age(5.0) < 80.0);
    }

    #[test]
    fn test_vb_degenerate_reference_ages_returns_l1() {
        let mut ids = IdAllocator::new();
        let g = VonBertalanffyGrowth::<f64>::new(&mut ids, 20.0, 80.0, 0.3, 5.0, 5.0, 1e-5, 3.0);
        assert_eq!(g.length_at_age(3.0), 20.0);
        assert_eq!(g.length_at_age(9.0), 20.0);
    }

    #[test]
    fn test_vb_weight_follows_power_law() {
        let mut ids = IdAllocator::new();
        let g = vb(&mut ids);
        let length = g.length_at_age(4.0);
        assert!((g.weight_at_age(4.0) - 1e-5 * length.powi(3)).abs() < 1e-12);
    }

    #[test]
    fn test_products_cache_fills_once_and_tracks_changes() {
        let mut ids = IdAllocator::new();
        let mut g = vb(&mut ids);
        g.prepare();
        let w0 = g.products().mean_weight_at_age[0];
        assert!((w0 - g.weight_at_age(1.0)).abs() < 1e-12);

        // Unchanged parameters: cache untouched (same values back).
        g.prepare();
        assert_eq!(g.products().mean_weight_at_age[0], w0);

        // Parameter change invalidates the cache.
        g.length_at_ref_age_1.set_value(0, 25.0);
        g.prepare();
        assert!((g.products().mean_length_at_age[0] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_alk_rows_sum_to_one_over_a_wide_bin_range() {
        let mut ids = IdAllocator::new();
        let mut g = vb(&mut ids);
        g.prepare();
        // bins 1..=120 comfortably cover every length distribution
        let bins: Vec<f64> = (1..=120).map(|b| b as f64).collect();
        let alk = g.age_length_key(&bins);
        for a in 0..10 {
            let row: f64 = (0..bins.len()).map(|l| alk[a * bins.len() + l]).sum();
            assert!((row - 1.0).abs() < 1e-3, "age {a} row sums to {row}");
        }
    }
}
