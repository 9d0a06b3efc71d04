//! Shared bookkeeping for composite distributions.
//!
//! Purpose
//! -------
//! Provide [`CompositeCore`], the state every composite distribution carries:
//! the ordered submodel entries, the optional own-parameters fixed at freeze
//! time, and the frozen flag. Joint distributions store a per-submodel
//! parameter list here; mixtures store their mixing weights — hence the
//! generic own-parameter type.
//!
//! Key behaviors
//! -------------
//! - Frozen status derives from construction: an explicit force-frozen flag
//!   wins; otherwise a composite is frozen iff own-parameters were supplied.
//! - [`CompositeCore::validate_parameters`] enforces the freeze contract in
//!   both directions and hands back the effective parameters.
//! - [`CompositeCore::freeze_submodels`] freezes every entry with its own
//!   mapping through the submodel contract; re-freezing is illegal.
//! - [`CompositeCore::split_data`] cuts the trailing data axis into
//!   per-submodel chunks sized by the declared dimensionalities.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least one submodel entry exists.
//! - When own-parameters are stored, their arity matched the submodel count
//!   at the point they were accepted (the owning composite checks this).
//! - A force-frozen composite may hold no own-parameters; callers treat the
//!   effective parameters as empty mappings in that case.
use std::borrow::Borrow;

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};

use crate::composite::errors::{CompositeError, CompositeResult};
use crate::composite::params::Params;
use crate::composite::submodel::SubmodelEntry;
use crate::structure::errors::StructureError;

/// Shared state of a composite distribution.
///
/// `P` is the own-parameter type: `Vec<Params>` for joint distributions,
/// `Vec<f64>` mixing weights for mixtures.
#[derive(Clone, Debug)]
pub struct CompositeCore<P> {
    entries: Vec<SubmodelEntry>,
    params: Option<P>,
    frozen: bool,
}

impl<P: Clone> CompositeCore<P> {
    /// Build the shared state.
    ///
    /// Frozen status is `force_frozen || params.is_some()`: supplying
    /// own-parameters freezes the composite, and `force_frozen` marks a
    /// composite whose submodels were all supplied pre-frozen.
    ///
    /// # Errors
    /// - [`CompositeError::NoSubmodels`] if `entries` is empty.
    pub fn new(
        entries: Vec<SubmodelEntry>, params: Option<P>, force_frozen: bool,
    ) -> CompositeResult<CompositeCore<P>> {
        if entries.is_empty() {
            return Err(CompositeError::NoSubmodels);
        }
        let frozen = force_frozen || params.is_some();
        Ok(CompositeCore { entries, params, frozen })
    }

    /// The submodel entries, in order.
    pub fn entries(&self) -> &[SubmodelEntry] {
        &self.entries
    }

    /// Number of submodels.
    pub fn n_submodels(&self) -> usize {
        self.entries.len()
    }

    /// Total variate dimensionality along the trailing data axis.
    pub fn total_dims(&self) -> usize {
        self.entries.iter().map(|e| e.dims).sum()
    }

    /// Whether this composite is frozen.
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// The own-parameters stored at freeze time, if any.
    pub fn stored_params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    /// Validate supplied own-parameters against the freeze contract and
    /// return the effective ones.
    ///
    /// Frozen composites reject supplied parameters and yield the stored
    /// ones (absent for force-frozen instances); unfrozen composites require
    /// supplied parameters.
    ///
    /// # Errors
    /// - [`CompositeError::FrozenParameters`] if frozen and `supplied` is
    ///   present.
    /// - [`CompositeError::ParametersRequired`] if unfrozen and `supplied`
    ///   is absent.
    pub fn validate_parameters<'a, Q: ?Sized>(
        &'a self, supplied: Option<&'a Q>,
    ) -> CompositeResult<Option<&'a Q>>
    where
        P: Borrow<Q>,
    {
        match (self.frozen, supplied) {
            (true, Some(_)) => Err(CompositeError::FrozenParameters),
            (false, None) => Err(CompositeError::ParametersRequired),
            (true, None) => Ok(self.params.as_ref().map(Borrow::borrow)),
            (false, Some(p)) => Ok(Some(p)),
        }
    }

    /// Freeze every submodel with its corresponding parameter mapping.
    ///
    /// # Errors
    /// - [`CompositeError::AlreadyFrozen`] if this composite is frozen.
    /// - [`CompositeError::ParameterCountMismatch`] if `parameters` does not
    ///   hold one mapping per submodel.
    /// - Whatever a submodel's own `freeze` reports.
    pub fn freeze_submodels(&self, parameters: &[Params]) -> CompositeResult<Vec<SubmodelEntry>> {
        if self.frozen {
            return Err(CompositeError::AlreadyFrozen);
        }
        if parameters.len() != self.entries.len() {
            return Err(CompositeError::ParameterCountMismatch {
                expected: self.entries.len(),
                actual: parameters.len(),
            });
        }
        self.entries
            .iter()
            .zip(parameters)
            .map(|(entry, pars)| Ok(SubmodelEntry::new(entry.dist.freeze(pars)?, entry.dims)))
            .collect()
    }

    /// Split `x` along its trailing axis into per-submodel chunks sized by
    /// the declared dimensionalities, in submodel order.
    ///
    /// # Errors
    /// - [`StructureError::NoVariateAxis`] for 0-D input.
    /// - [`CompositeError::DataWidthMismatch`] if the trailing axis does not
    ///   match the total declared dimensionality.
    pub fn split_data(&self, x: ArrayViewD<'_, f64>) -> CompositeResult<Vec<ArrayD<f64>>> {
        if x.ndim() == 0 {
            return Err(StructureError::NoVariateAxis.into());
        }
        let last = Axis(x.ndim() - 1);
        let width = x.len_of(last);
        let total = self.total_dims();
        if width != total {
            return Err(CompositeError::DataWidthMismatch { expected: total, actual: width });
        }
        let mut chunks = Vec::with_capacity(self.entries.len());
        let mut start = 0;
        for entry in &self.entries {
            let end = start + entry.dims;
            chunks.push(x.slice_axis(last, Slice::from(start..end)).to_owned());
            start = end;
        }
        Ok(chunks)
    }
}
