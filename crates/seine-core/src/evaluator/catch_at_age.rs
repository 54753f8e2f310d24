//! The catch-at-age evaluator: the year x age traversal.
//!
//! One pass over every (population, year, age) cell produces all derived
//! quantities the likelihood layer consumes. Cell computation order is fixed
//! to satisfy dependencies:
//!
//!   1. Mortality (needs every fleet's selectivity and F for the cell)
//!   2. Maturity at age
//!   3. Numbers at age (initial structure, recruitment, or survival from the
//!      age-1/year-1 neighbor, with plus-group accumulation)
//!   4. Biomass and spawning biomass accumulation into year totals
//!   5. Per-fleet landings (Baranov) and index contributions
//!
//! The year loop runs to Y inclusive: spawning biomass is a start-of-year
//! quantity, so one extra pass yields the population structure at the end of
//! the terminal year. Mortality, landings, and indices are data-year
//! quantities and stop at Y - 1.
//!
//! After the traversal, compositions are aggregated (age first, then length
//! through the conversion matrix) and the log-scale expected landings and
//! indices are reduced in the units each fleet's observations are recorded
//! in.

use std::collections::BTreeMap;

use crate::context::ObjectId;
use crate::data::DataUnits;
use crate::entity::{Fleet, ModelEntities, Population};
use crate::math::Scalar;
use crate::store::{DimensionInfo, QuantityStore};
use crate::submodel::SubmoduleSet;

use super::Evaluator;

// Population-scoped quantity names.
const NUMBERS_AT_AGE: &str = "numbers_at_age";
const UNFISHED_NUMBERS_AT_AGE: &str = "unfished_numbers_at_age";
const MORTALITY_F: &str = "mortality_F";
const MORTALITY_M: &str = "mortality_M";
const MORTALITY_Z: &str = "mortality_Z";
const SUM_SELECTIVITY: &str = "sum_selectivity";
const PROPORTION_MATURE_AT_AGE: &str = "proportion_mature_at_age";
const BIOMASS: &str = "biomass";
const UNFISHED_BIOMASS: &str = "unfished_biomass";
const SPAWNING_BIOMASS: &str = "spawning_biomass";
const UNFISHED_SPAWNING_BIOMASS: &str = "unfished_spawning_biomass";
const SPAWNING_BIOMASS_RATIO: &str = "spawning_biomass_ratio";
const EXPECTED_RECRUITMENT: &str = "expected_recruitment";
const TOTAL_LANDINGS_WEIGHT: &str = "total_landings_weight";
const TOTAL_LANDINGS_NUMBERS: &str = "total_landings_numbers";

// Fleet-scoped quantity names.
const LANDINGS_NUMBERS_AT_AGE: &str = "landings_numbers_at_age";
const LANDINGS_WEIGHT_AT_AGE: &str = "landings_weight_at_age";
const LANDINGS_NUMBERS: &str = "landings_numbers";
const LANDINGS_WEIGHT: &str = "landings_weight";
const LANDINGS_EXPECTED: &str = "landings_expected";
const LOG_LANDINGS_EXPECTED: &str = "log_landings_expected";
const INDEX_NUMBERS_AT_AGE: &str = "index_numbers_at_age";
const INDEX_WEIGHT_AT_AGE: &str = "index_weight_at_age";
const INDEX_NUMBERS: &str = "index_numbers";
const INDEX_WEIGHT: &str = "index_weight";
const INDEX_EXPECTED: &str = "index_expected";
const LOG_INDEX_EXPECTED: &str = "log_index_expected";
const AGECOMP_EXPECTED: &str = "agecomp_expected";
const AGECOMP_PROPORTION: &str = "agecomp_proportion";
const LENGTHCOMP_EXPECTED: &str = "lengthcomp_expected";
const LENGTHCOMP_PROPORTION: &str = "lengthcomp_proportion";
const LANDINGS_NUMBERS_AT_LENGTH: &str = "landings_numbers_at_length";
const INDEX_NUMBERS_AT_LENGTH: &str = "index_numbers_at_length";

/// Age-structured population-dynamics evaluator.
#[derive(Debug, Default)]
pub struct CatchAtAge<T> {
    store: QuantityStore<T>,
}

impl<T: Scalar> CatchAtAge<T> {
    pub fn new() -> Self {
        Self { store: QuantityStore::new() }
    }

    fn register_population(&mut self, population: &Population<T>) {
        let id = population.id();
        let ny = population.n_years;
        let na = population.n_ages;
        let pdq = &mut self.store.populations;

        // (year, age) matrices written in the terminal closeout year too
        for name in [NUMBERS_AT_AGE, UNFISHED_NUMBERS_AT_AGE, PROPORTION_MATURE_AT_AGE] {
            pdq.register(
                id,
                name,
                (ny + 1) * na,
                DimensionInfo::new(name, &[ny + 1, na], &["year", "age"]),
            );
        }
        // (year, age) matrices over data years only
        for name in [MORTALITY_F, MORTALITY_M, MORTALITY_Z, SUM_SELECTIVITY] {
            pdq.register(id, name, ny * na, DimensionInfo::new(name, &[ny, na], &["year", "age"]));
        }
        // per-year with terminal closeout
        for name in [
            BIOMASS,
            UNFISHED_BIOMASS,
            SPAWNING_BIOMASS,
            UNFISHED_SPAWNING_BIOMASS,
            SPAWNING_BIOMASS_RATIO,
            EXPECTED_RECRUITMENT,
        ] {
            pdq.register(id, name, ny + 1, DimensionInfo::new(name, &[ny + 1], &["year"]));
        }
        // per data year
        for name in [TOTAL_LANDINGS_WEIGHT, TOTAL_LANDINGS_NUMBERS] {
            pdq.register(id, name, ny, DimensionInfo::new(name, &[ny], &["year"]));
        }
    }

    fn register_fleet(&mut self, fleet: &Fleet<T>) {
        let id = fleet.id();
        let ny = fleet.n_years;
        let na = fleet.n_ages;
        let nl = fleet.n_lengths;
        let fdq = &mut self.store.fleets;

        for name in [
            LANDINGS_NUMBERS_AT_AGE,
            LANDINGS_WEIGHT_AT_AGE,
            INDEX_NUMBERS_AT_AGE,
            INDEX_WEIGHT_AT_AGE,
            AGECOMP_EXPECTED,
            AGECOMP_PROPORTION,
        ] {
            fdq.register(id, name, ny * na, DimensionInfo::new(name, &[ny, na], &["year", "age"]));
        }
        for name in [
            LANDINGS_NUMBERS,
            LANDINGS_WEIGHT,
            LANDINGS_EXPECTED,
            LOG_LANDINGS_EXPECTED,
            INDEX_NUMBERS,
            INDEX_WEIGHT,
            INDEX_EXPECTED,
            LOG_INDEX_EXPECTED,
        ] {
            fdq.register(id, name, ny, DimensionInfo::new(name, &[ny], &["year"]));
        }
        for name in [
            LENGTHCOMP_EXPECTED,
            LENGTHCOMP_PROPORTION,
            LANDINGS_NUMBERS_AT_LENGTH,
            INDEX_NUMBERS_AT_LENGTH,
        ] {
            fdq.register(id, name, ny * nl, DimensionInfo::new(name, &[ny, nl], &["year", "length"]));
        }
    }

    /// Total mortality for cell `i = y * A + a`, summing fishing mortality
    /// over the population's fleets: `F[i] += Fmort_f[y] * f_mult[y] * s`.
    fn accumulate_mortality(
        &mut self,
        population: &Population<T>,
        fleets: &BTreeMap<ObjectId, Fleet<T>>,
        submodules: &SubmoduleSet<T>,
        i: usize,
        year: usize,
        age_index: usize,
    ) {
        let id = population.id();
        let age = T::constant(population.ages[age_index]);

        let mut f_total = T::zero();
        let mut s_total = T::zero();
        for fleet_id in &population.fleets {
            let fleet = &fleets[fleet_id];
            let s = submodules.selectivity(fleet.selectivity).selectivity(age);
            f_total += fleet.fmort(year) * population.f_multiplier(year) * s;
            s_total += s;
        }

        let pdq = &mut self.store.populations;
        pdq.get_mut(id, MORTALITY_F)[i] += f_total;
        pdq.get_mut(id, SUM_SELECTIVITY)[i] += s_total;
        let m = population.m(i);
        pdq.get_mut(id, MORTALITY_M)[i] = m;
        let f = pdq.get(id, MORTALITY_F)[i];
        pdq.get_mut(id, MORTALITY_Z)[i] = m + f;
    }

    fn compute_maturity(
        &mut self,
        population: &Population<T>,
        submodules: &SubmoduleSet<T>,
        i: usize,
        age_index: usize,
    ) {
        let maturity = submodules.maturity(population.maturity);
        let age = T::constant(population.ages[age_index]);
        self.store.populations.get_mut(population.id(), PROPORTION_MATURE_AT_AGE)[i] =
            maturity.proportion_mature(age);
    }

    /// Initial population structure: `N[0, a] = exp(log_init_naa[a])`.
    fn initial_numbers(&mut self, population: &Population<T>, i: usize, age_index: usize) {
        self.store.populations.get_mut(population.id(), NUMBERS_AT_AGE)[i] =
            population.log_init_naa.value(age_index).exp();
    }

    /// Survive the age-1/year-1 neighbor forward; the oldest bin also
    /// accumulates last year's plus group.
    fn advance_numbers(&mut self, population: &Population<T>, i: usize, j: usize, age_index: usize) {
        let id = population.id();
        let pdq = &mut self.store.populations;

        let survived = pdq.get(id, NUMBERS_AT_AGE)[j] * (-pdq.get(id, MORTALITY_Z)[j]).exp();
        let mut n = survived;
        if age_index == population.n_ages - 1 {
            n += pdq.get(id, NUMBERS_AT_AGE)[j + 1] * (-pdq.get(id, MORTALITY_Z)[j + 1]).exp();
        }
        pdq.get_mut(id, NUMBERS_AT_AGE)[i] = n;
    }

    /// Same update as [`Self::advance_numbers`] under natural mortality only.
    fn advance_unfished_numbers(
        &mut self,
        population: &Population<T>,
        i: usize,
        j: usize,
        age_index: usize,
    ) {
        let id = population.id();
        let pdq = &mut self.store.populations;

        let mut n = pdq.get(id, UNFISHED_NUMBERS_AT_AGE)[j] * (-population.m(j)).exp();
        if age_index == population.n_ages - 1 {
            n += pdq.get(id, UNFISHED_NUMBERS_AT_AGE)[j + 1] * (-population.m(j + 1)).exp();
        }
        pdq.get_mut(id, UNFISHED_NUMBERS_AT_AGE)[i] = n;
    }

    /// Equilibrium unfished spawning biomass per recruit, using year-0
    /// natural mortality and maturity, with the geometric-series closure for
    /// the plus group:
    ///
    /// `N[A-1] = N[A-2] exp(-M[A-2]) / (1 - exp(-M[A-1]))`
    fn spawning_biomass_per_recruit(
        &self,
        population: &Population<T>,
        submodules: &SubmoduleSet<T>,
    ) -> T {
        let id = population.id();
        let n_ages = population.n_ages;
        let growth = submodules.growth(population.growth);
        let maturity = self.store.populations.get(id, PROPORTION_MATURE_AT_AGE);

        let mut numbers = vec![T::one(); n_ages];
        let mut phi0 = numbers[0]
            * population.proportion_female_at_age(0)
            * maturity[0]
            * growth.weight_at_age(population.ages[0]);
        for a in 1..n_ages - 1 {
            numbers[a] = numbers[a - 1] * (-population.m(a)).exp();
            phi0 += numbers[a]
                * population.proportion_female_at_age(a)
                * maturity[a]
                * growth.weight_at_age(population.ages[a]);
        }
        let last = n_ages - 1;
        numbers[last] = numbers[last - 1] * (-population.m(last - 1)).exp()
            / (T::one() - (-population.m(last)).exp());
        phi0
            + numbers[last]
                * population.proportion_female_at_age(last)
                * maturity[last]
                * growth.weight_at_age(population.ages[last])
    }

    /// Recruitment for (year y >= 1, age 0).
    ///
    /// The terminal year has no data to inform a deviation, so it takes mean
    /// recruitment straight off the curve; every other year records the log
    /// mean and realizes the process (mean plus deviation).
    fn compute_recruitment(
        &mut self,
        population: &Population<T>,
        submodules: &mut SubmoduleSet<T>,
        i: usize,
        year: usize,
    ) {
        let id = population.id();
        let phi0 = self.spawning_biomass_per_recruit(population, submodules);
        let sb_prev = self.store.populations.get(id, SPAWNING_BIOMASS)[year - 1];

        let n = if year == population.n_years {
            submodules.recruitment(population.recruitment).evaluate_mean(sb_prev, phi0)
        } else {
            let mean = submodules.recruitment(population.recruitment).evaluate_mean(sb_prev, phi0);
            let recruitment = submodules.recruitment_mut(population.recruitment);
            recruitment.record_log_expected(year - 1, mean.ln());
            recruitment.evaluate_process(year - 1).exp()
        };

        let pdq = &mut self.store.populations;
        pdq.get_mut(id, NUMBERS_AT_AGE)[i] = n;
        pdq.get_mut(id, EXPECTED_RECRUITMENT)[year] = n;
    }

    /// Fold cell `i` into the year totals: fished and unfished biomass, and
    /// both spawning biomasses (female, mature, weighed).
    fn accumulate_biomass(
        &mut self,
        population: &Population<T>,
        submodules: &SubmoduleSet<T>,
        i: usize,
        year: usize,
        age_index: usize,
    ) {
        let id = population.id();
        let w = submodules.growth(population.growth).weight_at_age(population.ages[age_index]);
        let pf = population.proportion_female_at_age(age_index);

        let pdq = &mut self.store.populations;
        let naa = pdq.get(id, NUMBERS_AT_AGE)[i];
        let unfished = pdq.get(id, UNFISHED_NUMBERS_AT_AGE)[i];
        let mature = pdq.get(id, PROPORTION_MATURE_AT_AGE)[i];

        pdq.get_mut(id, BIOMASS)[year] += naa * w;
        pdq.get_mut(id, UNFISHED_BIOMASS)[year] += unfished * w;
        pdq.get_mut(id, SPAWNING_BIOMASS)[year] += pf * naa * mature * w;
        pdq.get_mut(id, UNFISHED_SPAWNING_BIOMASS)[year] += pf * unfished * mature * w;
    }

    /// Per-fleet landings at age by the Baranov catch equation, plus the
    /// year totals. A fleet with no observed landings keeps its at-age
    /// vectors (fixed arithmetic shape) but contributes nothing to any
    /// landings total.
    fn accumulate_landings(
        &mut self,
        population: &Population<T>,
        fleets: &BTreeMap<ObjectId, Fleet<T>>,
        submodules: &SubmoduleSet<T>,
        i: usize,
        year: usize,
        age_index: usize,
    ) {
        let id = population.id();
        let age = population.ages[age_index];
        let w = submodules.growth(population.growth).weight_at_age(age);
        let z = self.store.populations.get(id, MORTALITY_Z)[i];
        let naa = self.store.populations.get(id, NUMBERS_AT_AGE)[i];

        for fleet_id in &population.fleets {
            let fleet = &fleets[fleet_id];
            let s = submodules.selectivity(fleet.selectivity).selectivity(T::constant(age));

            let fdq = &mut self.store.fleets;
            fdq.get_mut(*fleet_id, LANDINGS_NUMBERS_AT_AGE)[i] +=
                (fleet.fmort(year) * population.f_multiplier(year) * s) / z
                    * naa
                    * (T::one() - (-z).exp());
            let catch_numbers = fdq.get(*fleet_id, LANDINGS_NUMBERS_AT_AGE)[i];
            fdq.get_mut(*fleet_id, LANDINGS_WEIGHT_AT_AGE)[i] = catch_numbers * w;

            if fleet.has_landings_data() {
                let catch_weight = fdq.get(*fleet_id, LANDINGS_WEIGHT_AT_AGE)[i];
                fdq.get_mut(*fleet_id, LANDINGS_NUMBERS)[year] += catch_numbers;
                fdq.get_mut(*fleet_id, LANDINGS_WEIGHT)[year] += catch_weight;
                let pdq = &mut self.store.populations;
                pdq.get_mut(id, TOTAL_LANDINGS_NUMBERS)[year] += catch_numbers;
                pdq.get_mut(id, TOTAL_LANDINGS_WEIGHT)[year] += catch_weight;
            }
        }
    }

    /// Per-fleet survey index at age, `q[y] * s * N[i]`, and the year totals.
    fn accumulate_index(
        &mut self,
        population: &Population<T>,
        fleets: &BTreeMap<ObjectId, Fleet<T>>,
        submodules: &SubmoduleSet<T>,
        i: usize,
        year: usize,
        age_index: usize,
    ) {
        let id = population.id();
        let age = population.ages[age_index];
        let w = submodules.growth(population.growth).weight_at_age(age);
        let naa = self.store.populations.get(id, NUMBERS_AT_AGE)[i];

        for fleet_id in &population.fleets {
            let fleet = &fleets[fleet_id];
            let s = submodules.selectivity(fleet.selectivity).selectivity(T::constant(age));

            let fdq = &mut self.store.fleets;
            fdq.get_mut(*fleet_id, INDEX_NUMBERS_AT_AGE)[i] += fleet.q(year) * s * naa;
            let index_numbers = fdq.get(*fleet_id, INDEX_NUMBERS_AT_AGE)[i];
            fdq.get_mut(*fleet_id, INDEX_WEIGHT_AT_AGE)[i] = index_numbers * w;
            fdq.get_mut(*fleet_id, INDEX_NUMBERS)[year] += index_numbers;
            fdq.get_mut(*fleet_id, INDEX_WEIGHT)[year] += index_numbers * w;
        }
    }

    fn compute_spawning_biomass_ratio(&mut self, population: &Population<T>, year: usize) {
        let id = population.id();
        let pdq = &mut self.store.populations;
        let ratio = pdq.get(id, SPAWNING_BIOMASS)[year] / pdq.get(id, UNFISHED_SPAWNING_BIOMASS)[0];
        pdq.get_mut(id, SPAWNING_BIOMASS_RATIO)[year] = ratio;
    }

    /// Expected age composition per fleet-year: landings at age when the
    /// fleet has landings data, index at age otherwise. Proportions divide
    /// by the row sum; when observed compositions exist the expectations are
    /// rescaled so they sum to the observed sample size. A year whose
    /// observations are all missing keeps `expected = proportion`.
    fn evaluate_age_comp(&mut self, fleets: &BTreeMap<ObjectId, Fleet<T>>) {
        for fleet in fleets.values() {
            let id = fleet.id();
            for y in 0..fleet.n_years {
                let mut sum = T::zero();
                let mut sum_obs = 0.0;
                for a in 0..fleet.n_ages {
                    let i = y * fleet.n_ages + a;
                    let fdq = &mut self.store.fleets;
                    let expected = if fleet.has_landings_data() {
                        fdq.get(id, LANDINGS_NUMBERS_AT_AGE)[i]
                    } else {
                        fdq.get(id, INDEX_NUMBERS_AT_AGE)[i]
                    };
                    fdq.get_mut(id, AGECOMP_EXPECTED)[i] = expected;
                    sum += expected;
                    if let Some(obs) = &fleet.observed_agecomp {
                        if !obs.is_na(y, a) {
                            sum_obs += obs.at(y, a);
                        }
                    }
                }
                let row_has_obs = fleet
                    .observed_agecomp
                    .as_ref()
                    .map(|obs| obs.row_has_observations(y))
                    .unwrap_or(false);
                for a in 0..fleet.n_ages {
                    let i = y * fleet.n_ages + a;
                    let fdq = &mut self.store.fleets;
                    let proportion = fdq.get(id, AGECOMP_EXPECTED)[i] / sum;
                    fdq.get_mut(id, AGECOMP_PROPORTION)[i] = proportion;
                    if fleet.observed_agecomp.is_some() {
                        fdq.get_mut(id, AGECOMP_EXPECTED)[i] = if row_has_obs {
                            proportion * T::constant(sum_obs)
                        } else {
                            proportion
                        };
                    }
                }
            }
        }
    }

    /// Length compositions through the age-to-length conversion matrix, with
    /// the same normalization and rescaling rules as the age composition.
    fn evaluate_length_comp(&mut self, fleets: &BTreeMap<ObjectId, Fleet<T>>) {
        for fleet in fleets.values() {
            if fleet.n_lengths == 0 {
                continue;
            }
            let id = fleet.id();
            let nl = fleet.n_lengths;
            for y in 0..fleet.n_years {
                let mut sum = T::zero();
                let mut sum_obs = 0.0;
                for l in 0..nl {
                    let i_length_year = y * nl + l;
                    for a in 0..fleet.n_ages {
                        let i_age_year = y * fleet.n_ages + a;
                        let conv = T::constant(fleet.age_to_length_conversion[a * nl + l]);
                        let fdq = &mut self.store.fleets;
                        let agecomp = fdq.get(id, AGECOMP_EXPECTED)[i_age_year];
                        fdq.get_mut(id, LENGTHCOMP_EXPECTED)[i_length_year] += agecomp * conv;
                        let landings = fdq.get(id, LANDINGS_NUMBERS_AT_AGE)[i_age_year];
                        fdq.get_mut(id, LANDINGS_NUMBERS_AT_LENGTH)[i_length_year] +=
                            landings * conv;
                        let index = fdq.get(id, INDEX_NUMBERS_AT_AGE)[i_age_year];
                        fdq.get_mut(id, INDEX_NUMBERS_AT_LENGTH)[i_length_year] += index * conv;
                    }
                    sum += self.store.fleets.get(id, LENGTHCOMP_EXPECTED)[i_length_year];
                    if let Some(obs) = &fleet.observed_lengthcomp {
                        if !obs.is_na(y, l) {
                            sum_obs += obs.at(y, l);
                        }
                    }
                }
                let row_has_obs = fleet
                    .observed_lengthcomp
                    .as_ref()
                    .map(|obs| obs.row_has_observations(y))
                    .unwrap_or(false);
                for l in 0..nl {
                    let i_length_year = y * nl + l;
                    let fdq = &mut self.store.fleets;
                    let proportion = fdq.get(id, LENGTHCOMP_EXPECTED)[i_length_year] / sum;
                    fdq.get_mut(id, LENGTHCOMP_PROPORTION)[i_length_year] = proportion;
                    if fleet.observed_lengthcomp.is_some() {
                        fdq.get_mut(id, LENGTHCOMP_EXPECTED)[i_length_year] = if row_has_obs {
                            proportion * T::constant(sum_obs)
                        } else {
                            proportion
                        };
                    }
                }
            }
        }
    }

    /// Reduce the index to the units the fleet's observations use and take
    /// its log.
    fn evaluate_index_totals(&mut self, fleets: &BTreeMap<ObjectId, Fleet<T>>) {
        for fleet in fleets.values() {
            let id = fleet.id();
            for y in 0..fleet.n_years {
                let fdq = &mut self.store.fleets;
                let expected = match fleet.index_units {
                    DataUnits::Number => fdq.get(id, INDEX_NUMBERS)[y],
                    DataUnits::Weight => fdq.get(id, INDEX_WEIGHT)[y],
                };
                fdq.get_mut(id, INDEX_EXPECTED)[y] = expected;
                fdq.get_mut(id, LOG_INDEX_EXPECTED)[y] = expected.ln();
            }
        }
    }

    /// Same reduction for landings.
    fn evaluate_landings_totals(&mut self, fleets: &BTreeMap<ObjectId, Fleet<T>>) {
        for fleet in fleets.values() {
            let id = fleet.id();
            for y in 0..fleet.n_years {
                let fdq = &mut self.store.fleets;
                let expected = match fleet.landings_units {
                    DataUnits::Number => fdq.get(id, LANDINGS_NUMBERS)[y],
                    DataUnits::Weight => fdq.get(id, LANDINGS_WEIGHT)[y],
                };
                fdq.get_mut(id, LANDINGS_EXPECTED)[y] = expected;
                fdq.get_mut(id, LOG_LANDINGS_EXPECTED)[y] = expected.ln();
            }
        }
    }
}

impl<T: Scalar> Evaluator<T> for CatchAtAge<T> {
    fn initialize(&mut self, entities: &mut ModelEntities<T>) {
        let ModelEntities { populations, fleets, submodules } = entities;
        for population in populations.iter_mut() {
            population.allocate();
        }
        for population in populations.iter() {
            self.register_population(population);
            submodules
                .recruitment_mut(population.recruitment)
                .allocate(population.n_years);
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
            let id = population.id();
            let n_years = population.n_years;
            let n_ages = population.n_ages;

            for y in 0..=n_years {
                for a in 0..n_ages {
                    let i = y * n_ages + a;

                    // Mortality only exists for data years; the y = Y pass is
                    // the end-of-terminal-year closeout.
                    if y < n_years {
                        self.accumulate_mortality(population, fleets, submodules, i, y, a);
                    }
                    self.compute_maturity(population, submodules, i, a);

                    if y == 0 {
                        self.initial_numbers(population, i, a);
                        if a == 0 {
                            let recruits = self.store.populations.get(id, NUMBERS_AT_AGE)[i];
                            self.store.populations.get_mut(id, EXPECTED_RECRUITMENT)[0] = recruits;
                            let rzero =
                                submodules.recruitment(population.recruitment).log_rzero().exp();
                            self.store.populations.get_mut(id, UNFISHED_NUMBERS_AT_AGE)[i] = rzero;
                        } else {
                            // propagate along age within year 0
                            let pdq = &mut self.store.populations;
                            let survived = pdq.get(id, UNFISHED_NUMBERS_AT_AGE)[i - 1]
                                * (-population.m(i - 1)).exp();
                            pdq.get_mut(id, UNFISHED_NUMBERS_AT_AGE)[i] = survived;
                        }
                    } else if a == 0 {
                        self.compute_recruitment(population, submodules, i, y);
                        let rzero =
                            submodules.recruitment(population.recruitment).log_rzero().exp();
                        self.store.populations.get_mut(id, UNFISHED_NUMBERS_AT_AGE)[i] = rzero;
                    } else {
                        let j = (y - 1) * n_ages + (a - 1);
                        self.advance_numbers(population, i, j, a);
                        self.advance_unfished_numbers(population, i, j, a);
                    }

                    self.accumulate_biomass(population, submodules, i, y, a);

                    if y < n_years {
                        self.accumulate_landings(population, fleets, submodules, i, y, a);
                        self.accumulate_index(population, fleets, submodules, i, y, a);
                    }
                }
                self.compute_spawning_biomass_ratio(population, y);
            }
        }

        self.evaluate_age_comp(fleets);
        self.evaluate_length_comp(fleets);
        self.evaluate_index_totals(fleets);
        self.evaluate_landings_totals(fleets);

        T::zero()
    }

    fn store(&self) -> &QuantityStore<T> {
        &self.store
    }
}
