//! Estimable parameters.
//!
//! A [`Parameter`] is one scalar with its estimation bookkeeping: the value
//! the optimizer started from, the value it ended at, and whether the
//! optimizer may move it at all. A [`ParameterVector`] is the identity-bearing
//! sequence the registry walks when wiring parameters to the optimizer.

use serde::{Deserialize, Serialize};

use crate::context::{IdAllocator, ObjectId};
use crate::math::Scalar;

/// How the optimizer treats a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimationMode {
    /// Never estimated; stays at its initial value.
    Constant,
    /// Estimated as a fixed effect.
    FixedEffects,
    /// Estimated as a random effect (integrated over by the outer layer).
    RandomEffects,
}

impl EstimationMode {
    /// Whether this parameter occupies a slot in the optimizer's vector.
    pub fn is_estimated(self) -> bool {
        !matches!(self, EstimationMode::Constant)
    }
}

/// One scalar parameter.
///
/// `value` is the live scalar used by all arithmetic; `set_parameters`
/// overwrites it each optimizer step and `finalize` snapshots it into
/// `final_value`.
#[derive(Debug, Clone)]
pub struct Parameter<T> {
    pub value: T,
    pub initial_value: f64,
    pub final_value: f64,
    pub estimation_mode: EstimationMode,
}

impl<T: Scalar> Parameter<T> {
    pub fn new(initial: f64, estimation_mode: EstimationMode) -> Self {
        Self {
            value: T::constant(initial),
            initial_value: initial,
            final_value: initial,
            estimation_mode,
        }
    }
}

/// Identity-bearing vector of parameters.
#[derive(Debug, Clone)]
pub struct ParameterVector<T> {
    id: ObjectId,
    params: Vec<Parameter<T>>,
}

impl<T: Scalar> ParameterVector<T> {
    /// All elements share one estimation mode; per-element modes can be set
    /// afterwards through [`ParameterVector::param_mut`].
    pub fn new(ids: &mut IdAllocator, initial: &[f64], mode: EstimationMode) -> Self {
        Self {
            id: ids.allocate(),
            params: initial.iter().map(|&v| Parameter::new(v, mode)).collect(),
        }
    }

    /// An empty vector (a data stream the caller chose not to supply).
    pub fn empty(ids: &mut IdAllocator) -> Self {
        Self { id: ids.allocate(), params: Vec::new() }
    }

    /// Constant (never-estimated) values.
    pub fn constant(ids: &mut IdAllocator, values: &[f64]) -> Self {
        Self::new(ids, values, EstimationMode::Constant)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Live value of element `i`.
    pub fn value(&self, i: usize) -> T {
        self.params[i].value
    }

    /// Live value with length-1 broadcasting, mirroring
    /// [`DenseVector::force_scalar`](crate::vector::DenseVector::force_scalar).
    pub fn force_scalar(&self, i: usize) -> T {
        if self.params.len() == 1 {
            self.params[0].value
        } else {
            self.params[i].value
        }
    }

    pub fn set_value(&mut self, i: usize, v: T) {
        self.params[i].value = v;
    }

    pub fn param(&self, i: usize) -> &Parameter<T> {
        &self.params[i]
    }

    pub fn param_mut(&mut self, i: usize) -> &mut Parameter<T> {
        &mut self.params[i]
    }

    pub(crate) fn push(&mut self, p: Parameter<T>) {
        self.params.push(p);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter<T>> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter<T>> {
        self.params.iter_mut()
    }

    /// Number of elements the optimizer sees.
    pub fn estimated_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.estimation_mode.is_estimated())
            .count()
    }

    /// Snapshot every live value into `final_value`.
    pub fn capture_final_values(&mut self) {
        for p in &mut self.params {
            p.final_value = p.value.value();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_starts_at_initial() {
        let p: Parameter<f64> = Parameter::new(0.7, EstimationMode::FixedEffects);
        assert_eq!(p.value, 0.7);
        assert_eq!(p.initial_value, 0.7);
        assert_eq!(p.final_value, 0.7);
    }

    #[test]
    fn test_force_scalar_on_parameter_vector() {
        let mut ids = IdAllocator::new();
        let q = ParameterVector::<f64>::constant(&mut ids, &[-1.2]);
        assert_eq!(q.force_scalar(0), -1.2);
        assert_eq!(q.force_scalar(9), -1.2);

        let f = ParameterVector::<f64>::constant(&mut ids, &[0.1, 0.2]);
        assert_eq!(f.force_scalar(1), 0.2);
    }

    #[test]
    fn test_estimated_count_skips_constants() {
        let mut ids = IdAllocator::new();
        let mut v =
            ParameterVector::<f64>::new(&mut ids, &[1.0, 2.0, 3.0], EstimationMode::FixedEffects);
        v.param_mut(1).estimation_mode = EstimationMode::Constant;
        assert_eq!(v.estimated_count(), 2);
    }

    #[test]
    fn test_capture_final_values() {
        let mut ids = IdAllocator::new();
        let mut v = ParameterVector::<f64>::new(&mut ids, &[1.0], EstimationMode::FixedEffects);
        v.set_value(0, 4.5);
        v.capture_final_values();
        assert_eq!(v.param(0).final_value, 4.5);
        assert_eq!(v.param(0).initial_value, 1.0);
    }
}
