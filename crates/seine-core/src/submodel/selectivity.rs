//! Selectivity: the fraction of fish at age (or length) vulnerable to a
//! fleet's gear.

use crate::context::{IdAllocator, ObjectId};
use crate::math::{self, Scalar};
use crate::params::{EstimationMode, ParameterVector};

/// Asymptotic (logistic) selectivity.
#[derive(Debug, Clone)]
pub struct LogisticSelectivity<T> {
    id: ObjectId,
    pub inflection_point: ParameterVector<T>,
    pub slope: ParameterVector<T>,
}

impl<T: Scalar> LogisticSelectivity<T> {
    pub fn new(ids: &mut IdAllocator, inflection_point: f64, slope: f64) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            inflection_point: ParameterVector::new(ids, &[inflection_point], mode),
            slope: ParameterVector::new(ids, &[slope], mode),
        }
    }

    pub fn selectivity(&self, x: T) -> T {
        math::logistic(self.inflection_point.value(0), self.slope.value(0), x)
    }
}

/// Dome-shaped selectivity: an ascending logistic times one minus a
/// descending logistic.
#[derive(Debug, Clone)]
pub struct DoubleLogisticSelectivity<T> {
    id: ObjectId,
    pub inflection_point_asc: ParameterVector<T>,
    pub slope_asc: ParameterVector<T>,
    pub inflection_point_desc: ParameterVector<T>,
    pub slope_desc: ParameterVector<T>,
}

impl<T: Scalar> DoubleLogisticSelectivity<T> {
    pub fn new(
        ids: &mut IdAllocator,
        inflection_point_asc: f64,
        slope_asc: f64,
        inflection_point_desc: f64,
        slope_desc: f64,
    ) -> Self {
        let mode = EstimationMode::Constant;
        Self {
            id: ids.allocate(),
            inflection_point_asc: ParameterVector::new(ids, &[inflection_point_asc], mode),
            slope_asc: ParameterVector::new(ids, &[slope_asc], mode),
            inflection_point_desc: ParameterVector::new(ids, &[inflection_point_desc], mode),
            slope_desc: ParameterVector::new(ids, &[slope_desc], mode),
        }
    }

    pub fn selectivity(&self, x: T) -> T {
        let ascending =
            math::logistic(self.inflection_point_asc.value(0), self.slope_asc.value(0), x);
        let descending =
            math::logistic(self.inflection_point_desc.value(0), self.slope_desc.value(0), x);
        ascending * (T::one() - descending)
    }
}

/// The selectivity family.
#[derive(Debug, Clone)]
pub enum Selectivity<T> {
    Logistic(LogisticSelectivity<T>),
    DoubleLogistic(DoubleLogisticSelectivity<T>),
}

impl<T: Scalar> Selectivity<T> {
    pub fn id(&self) -> ObjectId {
        match self {
            Selectivity::Logistic(s) => s.id,
            Selectivity::DoubleLogistic(s) => s.id,
        }
    }

    pub fn selectivity(&self, x: T) -> T {
        match self {
            Selectivity::Logistic(s) => s.selectivity(x),
            Selectivity::DoubleLogistic(s) => s.selectivity(x),
        }
    }

    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        match self {
            Selectivity::Logistic(s) => {
                let id = s.id;
                visit(id, "inflection_point", &mut s.inflection_point);
                visit(id, "slope", &mut s.slope);
            }
            Selectivity::DoubleLogistic(s) => {
                let id = s.id;
                visit(id, "inflection_point_asc", &mut s.inflection_point_asc);
                visit(id, "slope_asc", &mut s.slope_asc);
                visit(id, "inflection_point_desc", &mut s.inflection_point_desc);
                visit(id, "slope_desc", &mut s.slope_desc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_selectivity_is_asymptotic() {
        let mut ids = IdAllocator::new();
        let s = LogisticSelectivity::<f64>::new(&mut ids, 2.0, 2.0);
        assert!((s.selectivity(2.0) - 0.5).abs() < 1e-12);
        assert!(s.selectivity(20.0) > 1.0 - 1e-9);
    }

    #[test]
    fn test_double_logistic_is_dome_shaped() {
        let mut ids = IdAllocator::new();
        let s = DoubleLogisticSelectivity::<f64>::new(&mut ids, 3.0, 2.0, 8.0, 2.0);
        let peak = s.selectivity(5.5);
        assert!(peak > s.selectivity(1.0));
        assert!(peak > s.selectivity(12.0));
        // old fish drop back toward zero
        assert!(s.selectivity(15.0) < 0.01);
    }
}
