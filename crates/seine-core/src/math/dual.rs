//! Forward-mode dual number.
//!
//! `Dual` carries a primal value and the derivative of that value with
//! respect to one chosen input. It is the in-tree differentiable
//! implementation of [`Scalar`](super::scalar::Scalar): seeding an input with
//! derivative 1 and running any engine computation yields the exact partial
//! derivative of every output, which is how the differentiability of the
//! traversal is tested. A production reverse-mode tape lives in the external
//! AD backend, not here.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{FromPrimitive, One, Zero};

use super::scalar::Scalar;

/// Value/derivative pair with the usual dual-number arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    /// Primal value.
    pub v: f64,
    /// Derivative of `v` with respect to the seeded input.
    pub d: f64,
}

impl Dual {
    /// A constant: derivative zero.
    pub fn constant(v: f64) -> Self {
        Self { v, d: 0.0 }
    }

    /// A seeded independent variable: derivative one.
    pub fn variable(v: f64) -> Self {
        Self { v, d: 1.0 }
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { v: self.v + rhs.v, d: self.d + rhs.d }
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { v: self.v - rhs.v, d: self.d - rhs.d }
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            v: self.v * rhs.v,
            d: self.d * rhs.v + self.v * rhs.d,
        }
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self {
            v: self.v / rhs.v,
            d: (self.d * rhs.v - self.v * rhs.d) / (rhs.v * rhs.v),
        }
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self { v: -self.v, d: -self.d }
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Dual {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Dual {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.v == 0.0 && self.d == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl FromPrimitive for Dual {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }

    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }

    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::constant(n))
    }
}

impl Scalar for Dual {
    fn exp(self) -> Self {
        let e = self.v.exp();
        Self { v: e, d: self.d * e }
    }

    fn ln(self) -> Self {
        Self { v: self.v.ln(), d: self.d / self.v }
    }

    fn powf(self, exponent: Self) -> Self {
        // d(u^w) = u^w * (w' ln u + w u'/u)
        let p = self.v.powf(exponent.v);
        Self {
            v: p,
            d: p * (exponent.d * self.v.ln() + exponent.v * self.d / self.v),
        }
    }

    fn tanh(self) -> Self {
        let t = self.v.tanh();
        Self { v: t, d: self.d * (1.0 - t * t) }
    }

    fn sqrt(self) -> Self {
        let s = self.v.sqrt();
        Self { v: s, d: self.d / (2.0 * s) }
    }

    fn value(self) -> f64 {
        self.v
    }
}
