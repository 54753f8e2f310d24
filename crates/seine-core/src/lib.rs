//! Age-structured fisheries stock-assessment engine.
//!
//! Given time-series observations from a fishery and a parametric
//! description of the populations and fleets, the engine computes expected
//! observations, internal state trajectories (numbers at age, biomass,
//! recruitment, mortality), and the scalar objective slot an external
//! optimizer minimizes. All arithmetic is generic over [`math::Scalar`] so
//! the same code evaluates in plain `f64` or under automatic
//! differentiation.

pub mod context;
pub mod data;
pub mod entity;
pub mod error;
pub mod evaluator;
pub mod math;
pub mod model;
pub mod params;
pub mod report;
pub mod store;
pub mod submodel;
pub mod vector;

pub use context::{IdAllocator, ObjectId};
pub use data::{DataUnits, ObservedMatrix, ObservedSeries};
pub use entity::{Fleet, Population};
pub use error::{BuildError, ModelError};
pub use evaluator::{CatchAtAge, Evaluator, SurplusProduction};
pub use math::{Dual, Scalar};
pub use model::{Evaluation, EvaluatorChoice, Model, ModelBuilder, ParameterEntry, ParameterRegistry};
pub use params::{EstimationMode, Parameter, ParameterVector};
pub use report::{ReportBundle, ReportEntry};
pub use store::{DimensionInfo, QuantityStore};
pub use submodel::{Depletion, Growth, Maturity, Recruitment, Selectivity, SubmoduleSet};
pub use vector::DenseVector;
