//! Errors for composite distributions (frozen-state checks, parameter
//! routing, mixture weights, reparameterisation, and submodel call failures).
//!
//! This module defines [`CompositeError`], used across the joint, mixture,
//! and transformed distributions, and the [`CompositeResult`] alias. Errors
//! raised by a submodel's own density or sampling call are wrapped with the
//! offending submodel's position and the parameter names that were attempted,
//! never swallowed.
//!
//! ## Conventions
//! - **Indices are 0-based** and refer to submodel positions.
//! - Structural failures from the tree layer convert via
//!   `From<StructureError>`.
//! - `statrs` constructor failures convert into [`CompositeError::AtomConstruction`].
use statrs::distribution::{ExpError, NormalError, PoissonError};

use crate::structure::errors::StructureError;

/// Result alias for composite-distribution operations that may produce
/// [`CompositeError`].
pub type CompositeResult<T> = Result<T, CompositeError>;

/// Unified error type for composite distribution modeling.
///
/// Covers frozen-state violations, parameter and weight validation,
/// reparameterisation failures, deliberately unsupported operations, and
/// wrapped submodel invocation errors. Implements `Display`/`Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeError {
    // ---- Frozen-state violations ----
    /// Parameters were supplied to a frozen distribution.
    FrozenParameters,

    /// No parameters were supplied to an unfrozen distribution.
    ParametersRequired,

    /// A frozen distribution was asked to freeze again.
    AlreadyFrozen,

    /// An override slot was modified on a frozen distribution.
    FrozenOverride,

    /// The model cannot be frozen through the single-map submodel contract.
    NotFreezable { model: &'static str },

    // ---- Construction / routing ----
    /// A composite was built with no submodels.
    NoSubmodels,

    /// Per-submodel parameter list length does not match the submodel count.
    ParameterCountMismatch { expected: usize, actual: usize },

    /// Override table length does not match the submodel count.
    OverrideCountMismatch { expected: usize, actual: usize },

    /// The trailing axis of the supplied data does not match the declared
    /// total variate dimensionality.
    DataWidthMismatch { expected: usize, actual: usize },

    /// A submodel index is out of range.
    SubmodelIndexOutOfRange { index: usize, count: usize },

    /// A required parameter name was not supplied.
    MissingParameter { name: String },

    // ---- Mixture weights ----
    /// No mixing weights were supplied and none are stored.
    MissingWeights,

    /// Weight vector length does not match the submodel count.
    WeightCountMismatch { expected: usize, actual: usize },

    /// The weight vector cannot drive a categorical draw.
    InvalidWeights { message: String },

    /// Mixture submodels disagree on variate dimensionality.
    MixtureWidthMismatch { index: usize, expected: usize, actual: usize },

    // ---- Normalised power mixture ----
    /// A discrete submodel was supplied where only continuous ones are
    /// supported.
    ContinuousOnly { index: usize },

    /// A multivariate submodel was supplied where only univariate ones are
    /// supported.
    UnivariateOnly { index: usize, dims: usize },

    /// The normalisation constant came out non-finite or non-positive.
    InvalidNormalisation { value: f64 },

    /// Sampling is deliberately not supported by this distribution variant.
    SamplingUnsupported { model: &'static str },

    // ---- Reparameterisation ----
    /// No usable argument names could be determined for a reparameterised
    /// distribution.
    NoUsableArguments { transform_args: Vec<String>, renaming: Vec<(String, String)> },

    /// A parameter rename rule could not be parsed.
    BadRenameRule { rule: String },

    // ---- Atom construction ----
    /// An underlying distribution rejected its construction parameters.
    AtomConstruction { message: String },

    // ---- Wrapped submodel failures ----
    /// A submodel's density evaluation failed.
    SubmodelDensity { index: usize, source: Box<CompositeError> },

    /// A submodel's sampling call failed.
    SubmodelRvs { index: usize, param_names: Vec<String>, source: Box<CompositeError> },

    /// A reparameterised distribution's sampling call failed after
    /// translating parameters.
    TransformRvs { orig_names: Vec<String>, transform_args: Vec<String>, source: Box<CompositeError> },

    // ---- Lower layers ----
    /// A structural failure from the nested-tree layer.
    Structure(StructureError),

    /// An array shape operation failed.
    Shape { message: String },
}

impl std::error::Error for CompositeError {}

impl std::fmt::Display for CompositeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Frozen-state violations ----
            CompositeError::FrozenParameters => {
                write!(
                    f,
                    "This distribution is frozen! The parameters used to compute its density cannot be altered."
                )
            }
            CompositeError::ParametersRequired => {
                write!(
                    f,
                    "This distribution is not frozen, but no parameters were supplied. Please provide some."
                )
            }
            CompositeError::AlreadyFrozen => {
                write!(
                    f,
                    "This distribution is already frozen! It cannot be re-frozen with different parameters."
                )
            }
            CompositeError::FrozenOverride => {
                write!(
                    f,
                    "This distribution is frozen! Override slots can only be set before freezing."
                )
            }
            CompositeError::NotFreezable { model } => {
                write!(
                    f,
                    "{model} cannot be frozen through a single parameter mapping; freeze it through its own freeze method and supply it pre-frozen."
                )
            }
            // ---- Construction / routing ----
            CompositeError::NoSubmodels => {
                write!(f, "A composite distribution needs at least one submodel.")
            }
            CompositeError::ParameterCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Parameter list length ({actual}) does not match the number of submodels ({expected})."
                )
            }
            CompositeError::OverrideCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Override table length ({actual}) does not match the number of submodels ({expected})."
                )
            }
            CompositeError::DataWidthMismatch { expected, actual } => {
                write!(
                    f,
                    "Trailing data axis has length {actual}, but the declared variate dimensionality is {expected}."
                )
            }
            CompositeError::SubmodelIndexOutOfRange { index, count } => {
                write!(f, "Submodel index {index} is out of range for {count} submodels.")
            }
            CompositeError::MissingParameter { name } => {
                write!(f, "Required parameter '{name}' was not supplied.")
            }
            // ---- Mixture weights ----
            CompositeError::MissingWeights => {
                write!(f, "No mixing weights were supplied.")
            }
            CompositeError::WeightCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Weight vector length ({actual}) does not match the number of submodels ({expected})."
                )
            }
            CompositeError::InvalidWeights { message } => {
                write!(f, "Mixing weights cannot drive a categorical draw: {message}")
            }
            CompositeError::MixtureWidthMismatch { index, expected, actual } => {
                write!(
                    f,
                    "Mixture submodel {index} has variate dimensionality {actual}, but the mixture requires {expected}."
                )
            }
            // ---- Normalised power mixture ----
            CompositeError::ContinuousOnly { index } => {
                write!(f, "Submodel {index} is discrete; only continuous submodels are supported here.")
            }
            CompositeError::UnivariateOnly { index, dims } => {
                write!(
                    f,
                    "Submodel {index} has variate dimensionality {dims}; only univariate submodels are supported here."
                )
            }
            CompositeError::InvalidNormalisation { value } => {
                write!(f, "Normalisation constant must be finite and > 0; got: {value}")
            }
            CompositeError::SamplingUnsupported { model } => {
                write!(f, "Random samples cannot be drawn from {model}.")
            }
            // ---- Reparameterisation ----
            CompositeError::NoUsableArguments { transform_args, renaming } => {
                write!(
                    f,
                    "Failed to find any arguments for this distribution! You may need to supply them explicitly via 'func_args'. Debug information: transform_args = {transform_args:?}, renaming = {renaming:?}"
                )
            }
            CompositeError::BadRenameRule { rule } => {
                write!(
                    f,
                    "Failed to parse parameter remapping instruction '{rule}' (expected the form 'a -> b')."
                )
            }
            // ---- Atom construction ----
            CompositeError::AtomConstruction { message } => {
                write!(f, "Underlying distribution rejected its parameters: {message}")
            }
            // ---- Wrapped submodel failures ----
            CompositeError::SubmodelDensity { index, source } => {
                write!(f, "Error while evaluating the density of submodel {index}: {source}")
            }
            CompositeError::SubmodelRvs { index, param_names, source } => {
                write!(
                    f,
                    "Error while sampling submodel {index} with parameters {param_names:?}: {source}"
                )
            }
            CompositeError::TransformRvs { orig_names, transform_args, source } => {
                write!(
                    f,
                    "Failed to sample the underlying distribution using arguments {orig_names:?} (derived through a transform declaring {transform_args:?}): {source}"
                )
            }
            // ---- Lower layers ----
            CompositeError::Structure(err) => {
                write!(f, "{err}")
            }
            CompositeError::Shape { message } => {
                write!(f, "Array shape operation failed: {message}")
            }
        }
    }
}

impl From<StructureError> for CompositeError {
    fn from(err: StructureError) -> CompositeError {
        CompositeError::Structure(err)
    }
}

impl From<ndarray::ShapeError> for CompositeError {
    fn from(err: ndarray::ShapeError) -> CompositeError {
        CompositeError::Shape { message: err.to_string() }
    }
}

impl From<NormalError> for CompositeError {
    fn from(err: NormalError) -> CompositeError {
        CompositeError::AtomConstruction { message: err.to_string() }
    }
}

impl From<ExpError> for CompositeError {
    fn from(err: ExpError) -> CompositeError {
        CompositeError::AtomConstruction { message: err.to_string() }
    }
}

impl From<PoissonError> for CompositeError {
    fn from(err: PoissonError) -> CompositeError {
        CompositeError::AtomConstruction { message: err.to_string() }
    }
}
