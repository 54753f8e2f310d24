//! The model facade: the one surface a binding layer touches.
//!
//! A [`ModelBuilder`] collects populations, fleets, and submodels, validates
//! the assembly, and produces a [`Model`] with its evaluator initialized and
//! its parameter registry frozen. From then on the optimizer loop is
//! `set_parameters` → `evaluate` → read the store or the objective, any
//! number of times, with `report`/`finalize` at the end.

use serde::Serialize;

use crate::context::{IdAllocator, ObjectId};
use crate::entity::{Fleet, ModelEntities, Population};
use crate::error::{BuildError, ModelError};
use crate::evaluator::{CatchAtAge, Evaluator, SurplusProduction};
use crate::math::Scalar;
use crate::params::EstimationMode;
use crate::report::{ReportBundle, ReportEntry};
use crate::store::QuantityStore;
use crate::submodel::{
    Depletion, DepletionHandle, Growth, GrowthHandle, Maturity, MaturityHandle, Recruitment,
    RecruitmentHandle, Selectivity, SelectivityHandle, SubmoduleSet,
};

/// Which evaluation strategy the model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorChoice {
    CatchAtAge,
    SurplusProduction,
}

/// One optimizer-visible parameter slot.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterEntry {
    /// Identity of the owning population, fleet, or submodel instance.
    pub owner: ObjectId,
    /// Name of the parameter vector within the owner.
    pub vector: String,
    /// Element index within the vector.
    pub index: usize,
    pub mode: EstimationMode,
    pub initial_value: f64,
}

/// The frozen registration of every estimated scalar, in the order
/// `set_parameters` consumes values. Same build inputs produce the same
/// order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParameterRegistry {
    entries: Vec<ParameterEntry>,
}

impl ParameterRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    /// The starting point for the optimizer.
    pub fn initial_values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.initial_value).collect()
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<T> {
    /// The engine's own objective contribution. Zero absent internal penalty
    /// terms; the external likelihood layer adds its terms on top after
    /// reading the store.
    pub objective: T,
}

/// Assembles a [`Model`].
pub struct ModelBuilder<T> {
    ids: IdAllocator,
    entities: ModelEntities<T>,
    choice: EvaluatorChoice,
}

impl<T: Scalar> ModelBuilder<T> {
    pub fn new(choice: EvaluatorChoice) -> Self {
        Self {
            ids: IdAllocator::new(),
            entities: ModelEntities::new(),
            choice,
        }
    }

    /// The id source for constructing parameter vectors and entities.
    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn add_growth(&mut self, g: Growth<T>) -> GrowthHandle {
        self.entities.submodules.add_growth(g)
    }

    pub fn add_maturity(&mut self, m: Maturity<T>) -> MaturityHandle {
        self.entities.submodules.add_maturity(m)
    }

    pub fn add_selectivity(&mut self, s: Selectivity<T>) -> SelectivityHandle {
        self.entities.submodules.add_selectivity(s)
    }

    pub fn add_recruitment(&mut self, r: Recruitment<T>) -> RecruitmentHandle {
        self.entities.submodules.add_recruitment(r)
    }

    pub fn add_depletion(&mut self, d: Depletion<T>) -> DepletionHandle {
        self.entities.submodules.add_depletion(d)
    }

    /// Register a fleet; returns its identity, which populations use to
    /// reference it.
    pub fn add_fleet(&mut self, fleet: Fleet<T>) -> ObjectId {
        let id = fleet.id();
        self.entities.fleets.insert(id, fleet);
        id
    }

    pub fn add_population(&mut self, population: Population<T>) -> ObjectId {
        let id = population.id();
        self.entities.populations.push(population);
        id
    }

    /// Validate the assembly, initialize the evaluator, and freeze the
    /// parameter registry.
    pub fn build(mut self) -> Result<Model<T>, BuildError> {
        self.validate()?;

        let mut evaluator: Box<dyn Evaluator<T>> = match self.choice {
            EvaluatorChoice::CatchAtAge => Box::new(CatchAtAge::new()),
            EvaluatorChoice::SurplusProduction => Box::new(SurplusProduction::new()),
        };
        evaluator.initialize(&mut self.entities);

        let mut entries = Vec::new();
        self.entities.visit_parameters(&mut |owner, vector, params| {
            for (index, p) in params.iter().enumerate() {
                if p.estimation_mode.is_estimated() {
                    entries.push(ParameterEntry {
                        owner,
                        vector: vector.to_string(),
                        index,
                        mode: p.estimation_mode,
                        initial_value: p.initial_value,
                    });
                }
            }
        });
        tracing::debug!(parameters = entries.len(), "model built");

        Ok(Model {
            entities: self.entities,
            evaluator,
            registry: ParameterRegistry { entries },
            finalized: false,
        })
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.entities.populations.is_empty() {
            return Err(BuildError::NoPopulations);
        }

        for population in &self.entities.populations {
            let entity = format!("population {}", population.id());
            let ny = population.n_years;
            let na = population.n_ages;

            if na < 2 || population.ages.iter().any(|&a| a <= 0.0) {
                return Err(BuildError::InvalidAgeGrid { entity });
            }

            match self.choice {
                EvaluatorChoice::CatchAtAge => {
                    check_len(&entity, "log_init_naa", population.log_init_naa.len(), &[na])?;
                    check_len(&entity, "log_m", population.log_m.len(), &[1, ny * na])?;
                    check_len(
                        &entity,
                        "log_f_multiplier",
                        population.log_f_multiplier.len(),
                        &[1, ny],
                    )?;
                    check_len(
                        &entity,
                        "proportion_female",
                        population.proportion_female.len(),
                        &[0, 1, na],
                    )?;
                    self.check_handles(&entity, population)?;
                }
                EvaluatorChoice::SurplusProduction => {
                    let handle =
                        population.depletion.ok_or_else(|| BuildError::MissingSubmodule {
                            entity: entity.clone(),
                            family: "depletion",
                        })?;
                    let depletion = self.entities.submodules.depletion(handle).inner();
                    check_len(&entity, "log_depletion", depletion.log_depletion.len(), &[ny + 1])?;
                }
            }

            for fleet_id in &population.fleets {
                if !self.entities.fleets.contains_key(fleet_id) {
                    return Err(BuildError::UnknownFleet { entity, fleet: *fleet_id });
                }
            }
        }

        for fleet in self.entities.fleets.values() {
            let entity = format!("fleet {}", fleet.id());
            let ny = fleet.n_years;
            let na = fleet.n_ages;
            let nl = fleet.n_lengths;

            check_len(&entity, "log_fmort", fleet.log_fmort.len(), &[1, ny])?;
            check_len(&entity, "log_q", fleet.log_q.len(), &[0, 1, ny])?;

            if nl > 0 {
                if fleet.age_to_length_conversion.is_empty() {
                    return Err(BuildError::EmptyConversionMatrix { entity, n_lengths: nl });
                }
                check_len(
                    &entity,
                    "age_to_length_conversion",
                    fleet.age_to_length_conversion.len(),
                    &[na * nl],
                )?;
            }

            if let Some(series) = &fleet.observed_landings {
                check_len(&entity, "observed_landings", series.len(), &[ny])?;
            }
            if let Some(series) = &fleet.observed_index {
                check_len(&entity, "observed_index", series.len(), &[ny])?;
            }
            if let Some(matrix) = &fleet.observed_agecomp {
                check_len(&entity, "observed_agecomp rows", matrix.n_years(), &[ny])?;
                check_len(&entity, "observed_agecomp bins", matrix.n_bins(), &[na])?;
            }
            if let Some(matrix) = &fleet.observed_lengthcomp {
                check_len(&entity, "observed_lengthcomp rows", matrix.n_years(), &[ny])?;
                check_len(&entity, "observed_lengthcomp bins", matrix.n_bins(), &[nl])?;
            }
        }

        Ok(())
    }

    fn check_handles(&self, entity: &str, population: &Population<T>) -> Result<(), BuildError> {
        let sub = &self.entities.submodules;
        if population.growth.0 >= sub.growth.len() {
            return Err(BuildError::UnknownSubmodule {
                entity: entity.to_string(),
                family: "growth",
                index: population.growth.0,
            });
        }
        if population.maturity.0 >= sub.maturity.len() {
            return Err(BuildError::UnknownSubmodule {
                entity: entity.to_string(),
                family: "maturity",
                index: population.maturity.0,
            });
        }
        if population.recruitment.0 >= sub.recruitment.len() {
            return Err(BuildError::UnknownSubmodule {
                entity: entity.to_string(),
                family: "recruitment",
                index: population.recruitment.0,
            });
        }
        Ok(())
    }
}

fn check_len(entity: &str, key: &str, actual: usize, allowed: &[usize]) -> Result<(), BuildError> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(BuildError::DimensionMismatch {
            entity: entity.to_string(),
            key: key.to_string(),
            expected: *allowed.last().unwrap_or(&0),
            actual,
        })
    }
}

/// An assembled, initialized model.
pub struct Model<T> {
    entities: ModelEntities<T>,
    evaluator: Box<dyn Evaluator<T>>,
    registry: ParameterRegistry,
    finalized: bool,
}

impl<T> std::fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl<T: Scalar> Model<T> {
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn n_parameters(&self) -> usize {
        self.registry.len()
    }

    /// Write optimizer values into the registered parameter positions, in
    /// registration order.
    pub fn set_parameters(&mut self, values: &[T]) -> Result<(), ModelError> {
        if values.len() != self.registry.len() {
            return Err(ModelError::ParameterLengthMismatch {
                expected: self.registry.len(),
                actual: values.len(),
            });
        }
        let mut cursor = 0;
        self.entities.visit_parameters(&mut |_, _, params| {
            for p in params.iter_mut() {
                if p.estimation_mode.is_estimated() {
                    p.value = values[cursor];
                    cursor += 1;
                }
            }
        });
        Ok(())
    }

    /// Run the evaluator. Pure in its inputs: repeated calls with unchanged
    /// parameters reproduce the store exactly.
    pub fn evaluate(&mut self) -> Evaluation<T> {
        let objective = self.evaluator.evaluate(&mut self.entities);
        Evaluation { objective }
    }

    /// The evaluator's derived-quantity store.
    pub fn store(&self) -> &QuantityStore<T> {
        self.evaluator.store()
    }

    /// Flatten the store into externally-consumable arrays with their
    /// dimension metadata.
    pub fn report(&self) -> ReportBundle {
        let store = self.evaluator.store();
        let mut entries = Vec::new();
        for (entity_id, name, vector, dims) in store.populations.iter() {
            entries.push(ReportEntry::new(entity_id, name, vector, dims));
        }
        for (entity_id, name, vector, dims) in store.fleets.iter() {
            entries.push(ReportEntry::new(entity_id, name, vector, dims));
        }
        ReportBundle::new(entries)
    }

    /// Snapshot final parameter values. May be called once; a second call
    /// warns and does nothing.
    pub fn finalize(&mut self) {
        if self.finalized {
            tracing::warn!("finalize called more than once; ignoring");
            return;
        }
        self.entities.visit_parameters(&mut |_, _, params| {
            params.capture_final_values();
        });
        self.finalized = true;
    }

    pub fn populations(&self) -> &[Population<T>] {
        &self.entities.populations
    }

    pub fn fleet(&self, id: ObjectId) -> Option<&Fleet<T>> {
        self.entities.fleets.get(&id)
    }

    pub fn submodules(&self) -> &SubmoduleSet<T> {
        &self.entities.submodules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataUnits, ObservedSeries};
    use crate::params::ParameterVector;
    use crate::submodel::depletion::PellaTomlinsonDepletion;
    use crate::submodel::growth::EmpiricalWeightAtAge;
    use crate::submodel::maturity::LogisticMaturity;
    use crate::submodel::recruitment::BevertonHoltRecruitment;
    use crate::submodel::selectivity::LogisticSelectivity;

    /// The S1-style single-fleet model assembled through the facade, with
    /// fishing mortality and initial numbers estimated.
    fn build_single_fleet() -> (Model<f64>, ObjectId, ObjectId) {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::CatchAtAge);

        let ages = vec![1.0, 2.0, 3.0, 4.0];
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), ages.clone(), &[1.0, 2.0, 3.0, 4.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let s = LogisticSelectivity::new(b.ids_mut(), 2.0, 2.0);
        let selectivity = b.add_selectivity(Selectivity::Logistic(s));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));

        let log_fmort =
            ParameterVector::new(b.ids_mut(), &[(0.1f64).ln()], EstimationMode::FixedEffects);
        let log_q = ParameterVector::empty(b.ids_mut());
        let fleet = Fleet::new(b.ids_mut(), 5, 4, selectivity, log_fmort, log_q)
            .with_observed_landings(ObservedSeries::new(vec![100.0; 5]), DataUnits::Weight);
        let fleet_id = b.add_fleet(fleet);

        let log_init_naa = ParameterVector::new(
            b.ids_mut(),
            &[1000.0f64.ln(), 819.0f64.ln(), 670.0f64.ln(), 549.0f64.ln()],
            EstimationMode::FixedEffects,
        );
        let log_m = ParameterVector::constant(b.ids_mut(), &[(0.2f64).ln()]);
        let log_f_multiplier = ParameterVector::constant(b.ids_mut(), &[0.0]);
        let proportion_female = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            5,
            ages,
            log_init_naa,
            log_m,
            log_f_multiplier,
            proportion_female,
            growth,
            maturity,
            recruitment,
        )
        .with_fleets(vec![fleet_id]);
        let population_id = b.add_population(population);

        (b.build().unwrap(), population_id, fleet_id)
    }

    #[test]
    fn test_facade_evaluates_and_reports() {
        let (mut model, population, _fleet) = build_single_fleet();
        let evaluation = model.evaluate();
        assert_eq!(evaluation.objective, 0.0);

        let report = model.report();
        let biomass = report.get(population, "biomass").unwrap();
        assert!((biomass.values[0] - 6844.0).abs() < 1e-9);
        assert_eq!(biomass.dims, vec![6]);
        assert_eq!(biomass.dim_names, vec!["year"]);

        let naa = report.get(population, "numbers_at_age").unwrap();
        assert_eq!(naa.dims, vec![6, 4]);
        assert!(report.to_json().unwrap().contains("numbers_at_age"));
    }

    #[test]
    fn test_registration_order_is_deterministic() {
        let (a, _, _) = build_single_fleet();
        let (b, _, _) = build_single_fleet();
        assert_eq!(a.n_parameters(), b.n_parameters());
        // log_init_naa (4) + log_fmort (1)
        assert_eq!(a.n_parameters(), 5);
        for (ea, eb) in a.registry().entries().iter().zip(b.registry().entries()) {
            assert_eq!(ea.owner, eb.owner);
            assert_eq!(ea.vector, eb.vector);
            assert_eq!(ea.index, eb.index);
            assert_eq!(ea.initial_value, eb.initial_value);
        }
        // populations register before fleets
        assert_eq!(a.registry().entries()[0].vector, "log_init_naa");
        assert_eq!(a.registry().entries()[4].vector, "log_fmort");
    }

    #[test]
    fn test_set_parameters_drives_the_evaluation() {
        let (mut model, population, _fleet) = build_single_fleet();
        let mut values = model.registry().initial_values();
        // double initial numbers at age 1
        values[0] = (2000.0f64).ln();
        model.set_parameters(&values).unwrap();
        model.evaluate();
        let report = model.report();
        let naa = report.get(population, "numbers_at_age").unwrap();
        assert!((naa.values[0] - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_parameters_rejects_wrong_length() {
        let (mut model, _, _) = build_single_fleet();
        let err = model.set_parameters(&[0.0]).unwrap_err();
        assert!(matches!(err, ModelError::ParameterLengthMismatch { expected: 5, actual: 1 }));
    }

    #[test]
    fn test_log_natural_log_round_trip() {
        let (mut model, _population, fleet) = build_single_fleet();
        let mut values = model.registry().initial_values();
        values[4] = (0.3f64).ln(); // log_fmort
        model.set_parameters(&values).unwrap();
        model.evaluate();
        let fmort = model.fleet(fleet).unwrap().fmort(0);
        let round_trip = fmort.ln();
        assert!((round_trip - (0.3f64).ln()).abs() <= 1e-14 * (0.3f64).ln().abs());
    }

    #[test]
    fn test_finalize_captures_once_and_warns_after() {
        let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
        let (mut model, _, _) = build_single_fleet();
        let mut values = model.registry().initial_values();
        values[4] = (0.25f64).ln();
        model.set_parameters(&values).unwrap();
        model.evaluate();
        model.finalize();
        let fleet_id = model.registry().entries()[4].owner;
        let captured = model.fleet(fleet_id).unwrap().log_fmort.param(0).final_value;
        assert!((captured - (0.25f64).ln()).abs() < 1e-14);

        // second call is a warning and a no-op
        let mut values = model.registry().initial_values();
        values[4] = (0.9f64).ln();
        model.set_parameters(&values).unwrap();
        model.finalize();
        let unchanged = model.fleet(fleet_id).unwrap().log_fmort.param(0).final_value;
        assert_eq!(unchanged, captured);
    }

    #[test]
    fn test_build_rejects_bad_age_grid() {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::CatchAtAge);
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), vec![1.0], &[1.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));
        let log_init_naa = ParameterVector::constant(b.ids_mut(), &[6.9]);
        let log_m = ParameterVector::constant(b.ids_mut(), &[(0.2f64).ln()]);
        let log_f_multiplier = ParameterVector::constant(b.ids_mut(), &[0.0]);
        let proportion_female = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            3,
            vec![1.0], // single age bin: no plus-group structure
            log_init_naa,
            log_m,
            log_f_multiplier,
            proportion_female,
            growth,
            maturity,
            recruitment,
        );
        b.add_population(population);
        assert!(matches!(b.build().unwrap_err(), BuildError::InvalidAgeGrid { .. }));
    }

    #[test]
    fn test_build_rejects_dimension_mismatch() {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::CatchAtAge);
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), vec![1.0, 2.0], &[1.0, 2.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));
        // three initial numbers for a two-age population
        let log_init_naa = ParameterVector::constant(b.ids_mut(), &[6.9, 6.7, 6.5]);
        let log_m = ParameterVector::constant(b.ids_mut(), &[(0.2f64).ln()]);
        let log_f_multiplier = ParameterVector::constant(b.ids_mut(), &[0.0]);
        let proportion_female = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            3,
            vec![1.0, 2.0],
            log_init_naa,
            log_m,
            log_f_multiplier,
            proportion_female,
            growth,
            maturity,
            recruitment,
        );
        b.add_population(population);
        let err = b.build().unwrap_err();
        assert!(matches!(err, BuildError::DimensionMismatch { ref key, .. } if key == "log_init_naa"));
    }

    #[test]
    fn test_build_rejects_unknown_fleet_reference() {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::CatchAtAge);
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), vec![1.0, 2.0], &[1.0, 2.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));
        let log_init_naa = ParameterVector::constant(b.ids_mut(), &[6.9, 6.7]);
        let log_m = ParameterVector::constant(b.ids_mut(), &[(0.2f64).ln()]);
        let log_f_multiplier = ParameterVector::constant(b.ids_mut(), &[0.0]);
        let proportion_female = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            3,
            vec![1.0, 2.0],
            log_init_naa,
            log_m,
            log_f_multiplier,
            proportion_female,
            growth,
            maturity,
            recruitment,
        )
        .with_fleets(vec![424242]);
        b.add_population(population);
        assert!(matches!(b.build().unwrap_err(), BuildError::UnknownFleet { fleet: 424242, .. }));
    }

    #[test]
    fn test_surplus_production_requires_a_depletion_submodel() {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::SurplusProduction);
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), vec![1.0, 2.0], &[1.0, 1.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));
        let population_log_init = ParameterVector::empty(b.ids_mut());
        let population_log_m = ParameterVector::empty(b.ids_mut());
        let population_log_init_f = ParameterVector::empty(b.ids_mut());
        let population_log_sigma_r = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            3,
            vec![1.0, 2.0],
            population_log_init,
            population_log_m,
            population_log_init_f,
            population_log_sigma_r,
            growth,
            maturity,
            recruitment,
        );
        b.add_population(population);
        assert!(matches!(
            b.build().unwrap_err(),
            BuildError::MissingSubmodule { family: "depletion", .. }
        ));
    }

    #[test]
    fn test_surplus_production_facade_round_trip() {
        let mut b = ModelBuilder::<f64>::new(EvaluatorChoice::SurplusProduction);
        let g = EmpiricalWeightAtAge::new(b.ids_mut(), vec![1.0, 2.0], &[1.0, 1.0]);
        let growth = b.add_growth(Growth::Empirical(g));
        let m = LogisticMaturity::new(b.ids_mut(), 2.0, 2.0);
        let maturity = b.add_maturity(Maturity::Logistic(m));
        let sel = LogisticSelectivity::new(b.ids_mut(), 1.5, 2.0);
        let selectivity = b.add_selectivity(Selectivity::Logistic(sel));
        let r = BevertonHoltRecruitment::new(b.ids_mut(), 0.75, 1000.0);
        let recruitment = b.add_recruitment(Recruitment::BevertonHolt(r));
        let d = PellaTomlinsonDepletion::new(b.ids_mut(), 0.2, 645.0, 2.0, 1.0, &[0.0, 0.0, 0.0, 0.0]);
        let depletion = b.add_depletion(Depletion::PellaTomlinson(d));

        let log_fmort = ParameterVector::constant(b.ids_mut(), &[(1e-10f64).ln()]);
        let log_q = ParameterVector::empty(b.ids_mut());
        let fleet = Fleet::new(b.ids_mut(), 3, 2, selectivity, log_fmort, log_q)
            .with_observed_landings(ObservedSeries::new(vec![10.0; 3]), DataUnits::Weight);
        let fleet_id = b.add_fleet(fleet);

        let population_log_init = ParameterVector::empty(b.ids_mut());
        let population_log_m = ParameterVector::empty(b.ids_mut());
        let population_log_init_f = ParameterVector::empty(b.ids_mut());
        let population_log_sigma_r = ParameterVector::empty(b.ids_mut());
        let population = Population::new(
            b.ids_mut(),
            3,
            vec![1.0, 2.0],
            population_log_init,
            population_log_m,
            population_log_init_f,
            population_log_sigma_r,
            growth,
            maturity,
            recruitment,
        )
        .with_depletion(depletion)
        .with_fleets(vec![fleet_id]);
        let population_id = b.add_population(population);

        let mut model = b.build().unwrap();
        model.evaluate();
        let report = model.report();
        let biomass = report.get(population_id, "biomass").unwrap();
        assert!((biomass.values[0] - 645.0).abs() < 1e-9);
        assert!((report.get(population_id, "fmsy").unwrap().values[0] - 0.1).abs() < 1e-12);
    }
}
