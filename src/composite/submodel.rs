//! The capability contract between composite distributions and their
//! submodels.
//!
//! Purpose
//! -------
//! Define the narrow interface a distribution-like object must expose to
//! participate in a composite: density-kind classification, declared
//! parameter names, log-density evaluation, sampling, and freezing. Both
//! atomic adapters and the composites themselves implement it, which is what
//! lets composites nest.
//!
//! Key behaviors
//! -------------
//! - [`DensityKind`] distinguishes continuous densities from discrete
//!   masses once, at construction, so no call site probes pdf-vs-pmf at
//!   evaluation time.
//! - [`Submodel::param_names`] is the argument-introspection surface:
//!   callers that need to know a distribution's arguments ask, rather than
//!   inspecting callables.
//! - [`Submodel::freeze`] is the freezable/pre-frozen capability split: a
//!   freezable model consumes a parameter mapping and returns a frozen copy;
//!   a pre-frozen model accepts only an empty mapping (yielding a clone) and
//!   rejects anything else.
//! - [`SubmodelEntry`] pairs a submodel with its variate dimensionality —
//!   the number of trailing-axis slots its realisations occupy.
//!
//! Conventions
//! -----------
//! - The trailing axis of `x` passed to [`Submodel::log_density`] is the
//!   variate axis; the result collapses it, yielding one log-density per
//!   realisation.
//! - [`Submodel::sample`] returns a `(size, dims)` matrix so trailing-axis
//!   concatenation across submodels is uniform.
//! - The RNG is caller-owned and passed as `&mut dyn RngCore`; the library
//!   holds no random state.
use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayD, ArrayViewD};
use rand::RngCore;

use crate::composite::errors::CompositeResult;
use crate::composite::params::Params;

/// Whether a submodel evaluates a probability density or a probability mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityKind {
    /// Continuous support; log-densities come from a pdf.
    Continuous,
    /// Discrete support; log-densities come from a pmf.
    Discrete,
}

/// Replacement log-density for one submodel slot of a joint distribution.
///
/// Receives the submodel's sliced data (trailing axis = that submodel's
/// variates) and its effective parameter mapping, and returns per-realisation
/// log-densities with the trailing axis collapsed.
pub type LogDensityFn =
    Arc<dyn Fn(ArrayViewD<'_, f64>, &Params) -> CompositeResult<ArrayD<f64>> + Send + Sync>;

/// Capability contract for anything usable as a composite's submodel.
pub trait Submodel: Send + Sync + fmt::Debug {
    /// Density kind, fixed at construction.
    fn kind(&self) -> DensityKind;

    /// Declared parameter names; empty for frozen models.
    fn param_names(&self) -> Vec<String>;

    /// Per-realisation log-density of `x` under `params`.
    ///
    /// The trailing axis of `x` is the variate axis and is collapsed in the
    /// result.
    fn log_density(&self, x: ArrayViewD<'_, f64>, params: &Params) -> CompositeResult<ArrayD<f64>>;

    /// Draw `size` realisations under `params`, as a `(size, dims)` matrix.
    fn sample(
        &self, size: usize, params: &Params, rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>>;

    /// Produce a frozen copy with `params` fixed.
    ///
    /// Pre-frozen models accept only an empty mapping and return a clone of
    /// themselves; supplying parameters to one is an error.
    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>>;
}

/// One submodel slot of a composite: the model plus its declared variate
/// dimensionality along the trailing data axis.
#[derive(Clone)]
pub struct SubmodelEntry {
    /// The submodel behind the capability contract.
    pub dist: Arc<dyn Submodel>,
    /// Number of trailing-axis slots one realisation of `dist` occupies.
    pub dims: usize,
}

impl SubmodelEntry {
    /// Pair a submodel with an explicit variate dimensionality.
    pub fn new(dist: Arc<dyn Submodel>, dims: usize) -> SubmodelEntry {
        SubmodelEntry { dist, dims }
    }

    /// A univariate submodel (the implicit dimensionality when none is
    /// declared).
    pub fn univariate(dist: Arc<dyn Submodel>) -> SubmodelEntry {
        SubmodelEntry::new(dist, 1)
    }
}

impl fmt::Debug for SubmodelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmodelEntry")
            .field("kind", &self.dist.kind())
            .field("dims", &self.dims)
            .finish()
    }
}
