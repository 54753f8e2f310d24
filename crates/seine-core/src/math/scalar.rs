//! The polymorphic scalar the whole engine is written against.
//!
//! Every arithmetic decision in the population dynamics must be expressible
//! both in plain `f64` and in a differentiable type, because the objective is
//! minimized by an external optimizer that needs first and second derivatives.
//! `Scalar` is the single bound used throughout: concrete evaluation uses
//! `f64`, derivative checks use [`Dual`](super::dual::Dual), and a
//! reverse-mode tape type supplied by an AD backend can implement the same
//! trait without touching engine code.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{FromPrimitive, One, Zero};

/// Arithmetic + elementary transcendentals, closed over the implementing type.
///
/// `PartialOrd` is available for structural decisions (sorting ages, test
/// assertions); evaluation code never branches on it with parameter-dependent
/// values — smooth kernels in [`crate::math`] exist for that.
pub trait Scalar:
    Copy
    + Clone
    + Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Zero
    + One
    + FromPrimitive
    + 'static
{
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn powf(self, exponent: Self) -> Self;
    fn tanh(self) -> Self;
    fn sqrt(self) -> Self;

    /// Collapse to the underlying primal value (drops derivative information).
    fn value(self) -> f64;

    /// Lift a plain constant into the scalar type.
    fn constant(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v)
            .unwrap_or_else(|| unreachable!("scalar types are constructible from f64"))
    }
}

impl Scalar for f64 {
    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn tanh(self) -> Self {
        f64::tanh(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn value(self) -> f64 {
        self
    }
}
