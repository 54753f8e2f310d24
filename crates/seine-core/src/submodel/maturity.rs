//! Maturity: proportion of the population mature at age.

use crate::context::{IdAllocator, ObjectId};
use crate::math::{self, Scalar};
use crate::params::{EstimationMode, ParameterVector};

/// Logistic maturity ogive.
///
/// The inflection point is the age at which half the fish are mature. Both
/// parameters may be length 1 (time-invariant) or length Y; the year-indexed
/// operation broadcasts through `force_scalar`.
#[derive(Debug, Clone)]
pub struct LogisticMaturity<T> {
    id: ObjectId,
    pub inflection_point: ParameterVector<T>,
    pub slope: ParameterVector<T>,
}

impl<T: Scalar> LogisticMaturity<T> {
    pub fn new(ids: &mut IdAllocator, inflection_point: f64, slope: f64) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            inflection_point: ParameterVector::new(ids, &[inflection_point], mode),
            slope: ParameterVector::new(ids, &[slope], mode),
        }
    }

    pub fn proportion_mature(&self, x: T) -> T {
        math::logistic(self.inflection_point.value(0), self.slope.value(0), x)
    }

    pub fn proportion_mature_in_year(&self, x: T, year: usize) -> T {
        math::logistic(
            self.inflection_point.force_scalar(year),
            self.slope.force_scalar(year),
            x,
        )
    }
}

/// The maturity family.
#[derive(Debug, Clone)]
pub enum Maturity<T> {
    Logistic(LogisticMaturity<T>),
}

impl<T: Scalar> Maturity<T> {
    pub fn id(&self) -> ObjectId {
        match self {
            Maturity::Logistic(m) => m.id,
        }
    }

    pub fn proportion_mature(&self, x: T) -> T {
        match self {
            Maturity::Logistic(m) => m.proportion_mature(x),
        }
    }

    pub fn proportion_mature_in_year(&self, x: T, year: usize) -> T {
        match self {
            Maturity::Logistic(m) => m.proportion_mature_in_year(x, year),
        }
    }

    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        match self {
            Maturity::Logistic(m) => {
                let id = m.id;
                visit(id, "inflection_point", &mut m.inflection_point);
                visit(id, "slope", &mut m.slope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_mature_at_inflection() {
        let mut ids = IdAllocator::new();
        let m = LogisticMaturity::<f64>::new(&mut ids, 2.0, 2.0);
        assert!((m.proportion_mature(2.0) - 0.5).abs() < 1e-12);
        assert!(m.proportion_mature(10.0) > 0.999);
        assert!(m.proportion_mature(0.0) < 0.05);
    }

    #[test]
    fn test_year_indexed_form_broadcasts() {
        let mut ids = IdAllocator::new();
        let m = LogisticMaturity::<f64>::new(&mut ids, 2.0, 2.0);
        // length-1 parameters answer for any year
        assert_eq!(
            m.proportion_mature_in_year(3.0, 0),
            m.proportion_mature_in_year(3.0, 14)
        );
    }
}
