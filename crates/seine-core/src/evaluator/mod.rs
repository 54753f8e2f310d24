//! Evaluation strategies.
//!
//! Two evaluators share the same entity abstractions: the age-structured
//! catch-at-age traversal and the biomass-only surplus-production recursion.
//! Each owns its derived-quantity store — the same population exposes
//! different quantities under different evaluators.

pub mod catch_at_age;
pub mod surplus_production;

pub use catch_at_age::CatchAtAge;
pub use surplus_production::SurplusProduction;

use crate::entity::ModelEntities;
use crate::math::Scalar;
use crate::store::QuantityStore;

/// One evaluation strategy over a set of populations and fleets.
///
/// The lifecycle is `initialize` once, then any number of
/// (`set_parameters` →) `evaluate` rounds. `evaluate` calls `prepare`
/// itself, so repeated calls with unchanged parameters reproduce the store
/// bit for bit.
pub trait Evaluator<T: Scalar> {
    /// Allocate every derived-quantity vector and working buffer. Called
    /// exactly once, at model build.
    fn initialize(&mut self, entities: &mut ModelEntities<T>);

    /// Zero the store and transform parameters to natural scale.
    fn prepare(&mut self, entities: &mut ModelEntities<T>);

    /// Run the traversal, filling the store. Returns this evaluator's
    /// contribution to the objective (zero absent internal penalty terms —
    /// likelihoods are layered on by the caller).
    fn evaluate(&mut self, entities: &mut ModelEntities<T>) -> T;

    /// The derived-quantity store this evaluator fills.
    fn store(&self) -> &QuantityStore<T>;
}
