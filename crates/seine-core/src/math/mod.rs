//! Numeric kernel: the small set of smooth functions the population dynamics
//! are built from.
//!
//! Every function here is a single branch-free expression over the scalar
//! axis. Where a hard nonlinearity would normally appear (|x|, max, sign),
//! a smooth surrogate is used instead so the whole evaluation stays
//! differentiable end to end.

pub mod dual;
pub mod scalar;

pub use dual::Dual;
pub use scalar::Scalar;

/// Smoothing constant for [`smooth_abs`] (and through it the smooth extrema).
const SMOOTH_ABS_C: f64 = 1e-5;

/// Slope constant for [`smooth_sign`].
const SIGN_K: f64 = 1000.0;

/// Logistic curve: `1 / (1 + exp(-slope * (x - inflection)))`.
pub fn logistic<T: Scalar>(inflection: T, slope: T, x: T) -> T {
    T::one() / (T::one() + (-slope * (x - inflection)).exp())
}

/// Bounded inverse logit: maps the real line onto `(min, max)`.
pub fn inv_logit<T: Scalar>(min: T, max: T, x: T) -> T {
    min + (max - min) / (T::one() + (-x).exp())
}

/// Differentiable sign surrogate, `tanh(k * x)` with k = 1000.
pub fn smooth_sign<T: Scalar>(x: T) -> T {
    (T::constant(SIGN_K) * x).tanh()
}

/// Differentiable |x|, `sqrt(x^2 + c)` with c = 1e-5.
pub fn smooth_abs<T: Scalar>(x: T) -> T {
    (x * x + T::constant(SMOOTH_ABS_C)).sqrt()
}

/// Differentiable maximum, `(a + b + |a - b|) / 2` with the smooth |.|.
///
/// Used to clamp quantities away from zero (e.g. depletion) without breaking
/// the derivative.
pub fn smooth_max<T: Scalar>(a: T, b: T) -> T {
    (a + b + smooth_abs(a - b)) / T::constant(2.0)
}

/// Differentiable minimum, `(a + b - |a - b|) / 2` with the smooth |.|.
pub fn smooth_min<T: Scalar>(a: T, b: T) -> T {
    (a + b - smooth_abs(a - b)) / T::constant(2.0)
}

/// |erf(z)| by the Abramowitz & Stegun 7.1.26 rational polynomial.
///
/// The polynomial is valid for z >= 0, so it is evaluated on the smooth |z|;
/// callers recover the sign with [`smooth_sign`]. Max absolute error ~1.5e-7,
/// accurate enough for length-bin probabilities and cheap on an AD tape.
pub fn erf_approx<T: Scalar>(z: T) -> T {
    let a1 = T::constant(0.254829592);
    let a2 = T::constant(-0.284496736);
    let a3 = T::constant(1.421413741);
    let a4 = T::constant(-1.453152027);
    let a5 = T::constant(1.061405429);
    let p = T::constant(0.3275911);

    let t = T::one() / (T::one() + p * smooth_abs(z));
    T::one() - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-(z * z)).exp()
}

/// Cumulative normal distribution, differentiable in all three arguments.
///
/// `0.5 * (1 + sign(z) * |erf(z)|)` with the smooth sign,
/// `z = (x - mean) / (stddev * sqrt(2))`.
pub fn normal_cdf<T: Scalar>(x: T, mean: T, stddev: T) -> T {
    let z = (x - mean) / (stddev * T::constant(std::f64::consts::SQRT_2));
    T::constant(0.5) * (T::one() + smooth_sign(z) * erf_approx(z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_midpoint_and_tails() {
        assert!((logistic(2.0, 2.0, 2.0) - 0.5).abs() < 1e-12);
        assert!(logistic(2.0, 2.0, 20.0) > 1.0 - 1e-12);
        assert!(logistic(2.0, 2.0, -20.0) < 1e-12);
    }

    #[test]
    fn test_smooth_max_clamps_from_below() {
        // Far from the crossover the smooth max matches the hard max closely.
        assert!((smooth_max(5.0, 1e-3) - 5.0).abs() < 1e-6);
        // Below the floor it returns (almost exactly) the floor.
        assert!((smooth_max(-4.0, 1e-3) - 1e-3).abs() < 2e-3);
        // And it never dips meaningfully under it.
        assert!(smooth_max(-4.0, 1e-3) > 0.0);
    }

    #[test]
    fn test_smooth_min_and_sign() {
        assert!((smooth_min(5.0, 1.0) - 1.0).abs() < 1e-3);
        assert!((smooth_sign(1.0) - 1.0).abs() < 1e-12);
        assert!((smooth_sign(-1.0) + 1.0).abs() < 1e-12);
        assert!(smooth_sign(0.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf_reference_values() {
        use approx::assert_abs_diff_eq;

        // Standard normal: Phi(0) = 0.5, Phi(1.96) ~ 0.975.
        assert_abs_diff_eq!(normal_cdf(0.0, 0.0, 1.0), 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(normal_cdf(1.96, 0.0, 1.0), 0.975, epsilon = 1e-3);
        assert_abs_diff_eq!(normal_cdf(-1.96, 0.0, 1.0), 0.025, epsilon = 1e-3);
        // Shifted and scaled.
        assert_abs_diff_eq!(normal_cdf(12.0, 10.0, 2.0), 0.8413, epsilon = 1e-3);
    }

    #[test]
    fn test_inv_logit_bounds() {
        assert!((inv_logit(0.2, 1.0, 0.0) - 0.6).abs() < 1e-12);
        assert!(inv_logit(0.2, 1.0, 30.0) < 1.0 + 1e-12);
        assert!(inv_logit(0.2, 1.0, -30.0) > 0.2 - 1e-12);
    }

    #[test]
    fn test_kernel_is_differentiable() {
        use super::dual::Dual;

        // logistic'(x) at the inflection point is slope / 4
        let x = Dual::variable(2.0);
        let dl = logistic(Dual::constant(2.0), Dual::constant(2.0), x);
        assert!((dl.d - 0.5).abs() < 1e-9);

        // smooth_max keeps a nonzero derivative through the clamp region
        let y = Dual::variable(1e-3);
        let dm = smooth_max(y, Dual::constant(1e-3));
        assert!(dm.d.is_finite());
        assert!(dm.d > 0.0);
    }
}
