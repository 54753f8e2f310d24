//! Library errors.
//!
//! Construction-time misuse is fatal and refuses to build; numerical
//! degeneracies at evaluate time are never errors (they are handled locally
//! with smooth clamps or propagate as non-finite values, by contract).

/// Fatal errors raised while assembling a model.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{entity}: `{key}` has length {actual}, expected {expected}")]
    DimensionMismatch {
        entity: String,
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("{entity}: required {family} submodule reference is missing")]
    MissingSubmodule { entity: String, family: &'static str },

    #[error("{entity}: {family} submodule handle {index} does not exist")]
    UnknownSubmodule {
        entity: String,
        family: &'static str,
        index: usize,
    },

    #[error("{entity}: age grid must be non-empty with positive ages")]
    InvalidAgeGrid { entity: String },

    #[error("{entity}: {n_lengths} length bins declared but the age-to-length conversion matrix is empty")]
    EmptyConversionMatrix { entity: String, n_lengths: usize },

    #[error("{entity}: fleet id {fleet} referenced by the population was never added to the model")]
    UnknownFleet { entity: String, fleet: u32 },

    #[error("model has no populations")]
    NoPopulations,
}

/// Runtime misuse of an assembled model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("parameter vector has length {actual}, registry expects {expected}")]
    ParameterLengthMismatch { expected: usize, actual: usize },
}
