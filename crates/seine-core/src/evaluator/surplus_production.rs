//! The surplus-production evaluator: biomass dynamics without age structure.
//!
//! One derived scalar per year — depletion, biomass, harvest rate — driven
//! by observed catch through the Pella-Tomlinson production function. The
//! depletion state is clamped away from zero with a smooth maximum so the
//! recursion stays differentiable when a heavy catch would push it negative.
//!
//! Shares the entity abstractions with the catch-at-age evaluator; only the
//! traversal and the exposed quantities differ.

use std::collections::BTreeMap;

use crate::context::ObjectId;
use crate::entity::{Fleet, ModelEntities, Population};
use crate::math::{self, Scalar};
use crate::store::{DimensionInfo, QuantityStore};
use crate::submodel::{DepletionHandle, SubmoduleSet};

use super::Evaluator;

const BIOMASS: &str = "biomass";
const EXPECTED_DEPLETION: &str = "expected_depletion";
const OBSERVED_CATCH: &str = "observed_catch";
const HARVEST_RATE: &str = "harvest_rate";
const FMSY: &str = "fmsy";
const BMSY: &str = "bmsy";
const MSY: &str = "msy";

const INDEX_EXPECTED: &str = "index_expected";

/// Depletion floor: the production recursion never reports a depletion
/// below this.
const DEPLETION_FLOOR: f64 = 1e-3;

/// Biomass-dynamics (depletion) evaluator.
#[derive(Debug, Default)]
pub struct SurplusProduction<T> {
    store: QuantityStore<T>,
}

impl<T: Scalar> SurplusProduction<T> {
    pub fn new() -> Self {
        Self { store: QuantityStore::new() }
    }

    /// The population's depletion handle. Validated present at build time.
    fn depletion_handle(population: &Population<T>) -> DepletionHandle {
        population
            .depletion
            .unwrap_or_else(|| panic!("population {} has no depletion submodel", population.id()))
    }

    fn register_population(&mut self, population: &Population<T>) {
        let id = population.id();
        let ny = population.n_years;
        let pdq = &mut self.store.populations;

        for name in [BIOMASS, EXPECTED_DEPLETION] {
            pdq.register(id, name, ny + 1, DimensionInfo::new(name, &[ny + 1], &["year"]));
        }
        for name in [OBSERVED_CATCH, HARVEST_RATE] {
            pdq.register(id, name, ny, DimensionInfo::new(name, &[ny], &["year"]));
        }
        for name in [FMSY, BMSY, MSY] {
            pdq.register(id, name, 1, DimensionInfo::new(name, &[1], &["scalar"]));
        }
    }

    fn register_fleet(&mut self, fleet: &Fleet<T>) {
        let id = fleet.id();
        let ny = fleet.n_years;
        self.store.fleets.register(
            id,
            INDEX_EXPECTED,
            ny,
            DimensionInfo::new(INDEX_EXPECTED, &[ny], &["year"]),
        );
    }

    /// Sum observed landings over the population's fleets for `year`,
    /// skipping missing entries.
    fn accumulate_observed_catch(
        &mut self,
        population: &Population<T>,
        fleets: &BTreeMap<ObjectId, Fleet<T>>,
        year: usize,
    ) {
        let id = population.id();
        for fleet_id in &population.fleets {
            let fleet = &fleets[fleet_id];
            if let Some(landings) = &fleet.observed_landings {
                if !landings.is_na(year) {
                    self.store.populations.get_mut(id, OBSERVED_CATCH)[year] +=
                        T::constant(landings.at(year));
                }
            }
        }
    }

    /// One step of the depletion recursion. Year 0 takes the initial
    /// condition; later years push the previous realized depletion through
    /// the production function, floored at 1e-3.
    fn compute_depletion(
        &mut self,
        population: &Population<T>,
        submodules: &mut SubmoduleSet<T>,
        year: usize,
    ) {
        let id = population.id();
        let handle = Self::depletion_handle(population);

        let log_expected = if year == 0 {
            submodules.depletion(handle).inner().log_init_depletion.value(0)
        } else {
            let depletion_prev = submodules.depletion(handle).inner().depletion(year - 1);
            let catch_prev = self.store.populations.get(id, OBSERVED_CATCH)[year - 1];
            let mean = submodules.depletion(handle).evaluate_mean(depletion_prev, catch_prev);
            math::smooth_max(mean, T::constant(DEPLETION_FLOOR)).ln()
        };
        submodules.depletion_mut(handle).inner_mut().log_expected_depletion[year] = log_expected;

        // The realized series (random-effects capable) is what downstream
        // quantities read.
        let realized = submodules.depletion(handle).inner().log_depletion.value(year).exp();
        self.store.populations.get_mut(id, EXPECTED_DEPLETION)[year] = realized;
    }

    /// Survey index per fleet: depletion scaled by catchability.
    fn accumulate_index(
        &mut self,
        population: &Population<T>,
        fleets: &BTreeMap<ObjectId, Fleet<T>>,
        submodules: &SubmoduleSet<T>,
        year: usize,
    ) {
        let handle = Self::depletion_handle(population);
        let log_depletion = submodules.depletion(handle).inner().log_depletion.value(year);
        for fleet_id in &population.fleets {
            let fleet = &fleets[fleet_id];
            let index = (log_depletion + fleet.log_q.force_scalar(year)).exp();
            self.store.fleets.get_mut(*fleet_id, INDEX_EXPECTED)[year] += index;
        }
    }

    /// Biomass is depletion scaled back by carrying capacity; the harvest
    /// rate divides observed catch by it.
    fn compute_biomass(
        &mut self,
        population: &Population<T>,
        submodules: &SubmoduleSet<T>,
        year: usize,
    ) {
        let id = population.id();
        let handle = Self::depletion_handle(population);
        let k = submodules.depletion(handle).inner().log_k.value(0).exp();

        let pdq = &mut self.store.populations;
        let biomass = pdq.get(id, EXPECTED_DEPLETION)[year] * k;
        pdq.get_mut(id, BIOMASS)[year] = biomass;
        if year < population.n_years {
            let catch = pdq.get(id, OBSERVED_CATCH)[year];
            pdq.get_mut(id, HARVEST_RATE)[year] = catch / biomass;
        }
    }

    /// Closed-form Pella-Tomlinson reference points:
    ///
    /// `F_msy = r / (m - 1) * (1 - 1/m)`, `B_msy = K * m^(-1/(m-1))`,
    /// `MSY = F_msy * B_msy`.
    fn compute_reference_points(
        &mut self,
        population: &Population<T>,
        submodules: &SubmoduleSet<T>,
    ) {
        let id = population.id();
        let handle = Self::depletion_handle(population);
        let depletion = submodules.depletion(handle);
        let r = depletion.inner().r();
        let k = depletion.inner().k();
        let m = depletion.inner().m();
        let one = T::one();

        let fmsy = r / (m - one) * (one - one / m);
        let bmsy = k * m.powf(-(one / (m - one)));

        let pdq = &mut self.store.populations;
        pdq.get_mut(id, FMSY)[0] = fmsy;
        pdq.get_mut(id, BMSY)[0] = bmsy;
        pdq.get_mut(id, MSY)[0] = fmsy * bmsy;
    }
}

impl<T: Scalar> Evaluator<T> for SurplusProduction<T> {
    fn initialize(&mut self, entities: &mut ModelEntities<T>) {
        let ModelEntities { populations, fleets, .. } = entities;
        for population in populations.iter_mut() {
            population.allocate();
        }
        for population in populations.iter() {
            self.register_population(population);
        }
        for fleet in fleets.values_mut() {
            fleet.allocate();
        }
        for fleet in fleets.values() {
            self.register_fleet(fleet);
        }
    }

    fn prepare(&mut self, entities: &mut ModelEntities<T>) {
        let ModelEntities { populations, fleets, submodules } = entities;
        for population in populations.iter_mut() {
            self.store.populations.reset_all(population.id());
            population.prepare();
        }
        for fleet in fleets.values_mut() {
            self.store.fleets.reset_all(fleet.id());
            fleet.prepare();
        }
        submodules.prepare();
    }

    fn evaluate(&mut self, entities: &mut ModelEntities<T>) -> T {
        self.prepare(entities);
        let ModelEntities { populations, fleets, submodules } = entities;

        for population in populations.iter() {
            let n_years = population.n_years;
            for y in 0..=n_years {
                if y < n_years {
                    self.accumulate_observed_catch(population, fleets, y);
                }
                self.compute_depletion(population, submodules, y);
                if y < n_years {
                    self.accumulate_index(population, fleets, submodules, y);
                }
                self.compute_biomass(population, submodules, y);
            }
            self.compute_reference_points(population, submodules);
        }

        T::zero()
    }

    fn store(&self) -> &QuantityStore<T> {
        &self.store
    }
}
