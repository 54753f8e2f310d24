//! Model entities: populations, fleets, and the submodel arenas they
//! reference.

pub mod fleet;
pub mod population;

pub use fleet::Fleet;
pub use population::Population;

use std::collections::BTreeMap;

use crate::context::ObjectId;
use crate::math::Scalar;
use crate::params::ParameterVector;
use crate::submodel::SubmoduleSet;

/// Everything an evaluator operates on. Fleets are keyed by id so shared
/// fleets are initialized once no matter how many populations reference
/// them; iteration order over the map is ascending id, which fixes the
/// registration and report order.
#[derive(Debug, Default)]
pub struct ModelEntities<T> {
    pub populations: Vec<Population<T>>,
    pub fleets: BTreeMap<ObjectId, Fleet<T>>,
    pub submodules: SubmoduleSet<T>,
}

impl<T: Scalar> ModelEntities<T> {
    pub fn new() -> Self {
        Self {
            populations: Vec::new(),
            fleets: BTreeMap::new(),
            submodules: SubmoduleSet::new(),
        }
    }

    /// Visit every parameter vector in the fixed registration order:
    /// populations (insertion order), then fleets (ascending id), then
    /// submodules (family order, arena order).
    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        for p in &mut self.populations {
            p.visit_parameters(visit);
        }
        for f in self.fleets.values_mut() {
            f.visit_parameters(visit);
        }
        self.submodules.visit_parameters(visit);
    }
}
