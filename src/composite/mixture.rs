//! Finite mixture distributions with weighted component densities.
//!
//! Purpose
//! -------
//! Provide [`MixtureModel`], a weighted sum of submodel densities over a
//! shared observation space. Unlike a joint distribution, a mixture does not
//! split the data: every submodel sees the *same* `x`, because the mixture
//! describes alternative generative origins for one observation, not
//! independent coordinates.
//!
//! Key behaviors
//! -------------
//! - The mixture's own parameters are its mixing weights; supplying them at
//!   construction freezes the instance.
//! - `pdf` is the weighted sum of component densities; `logpdf` is its
//!   logarithm. No log-sum-exp form is implemented, so extreme component
//!   log-densities can underflow — a known limitation.
//! - `rvs` draws a categorical component label per output row, samples
//!   **every** submodel at the full requested size, then selects per row.
//!   This trades compute for simplicity and correctness under arbitrary
//!   submodel shapes: skewed weights still pay for full draws from every
//!   component.
//!
//! Invariants & assumptions
//! ------------------------
//! - All submodels share one variate dimensionality, checked at
//!   construction.
//! - A missing weight vector at density or sampling time is an error, even
//!   on an instance frozen without weights.
use std::sync::Arc;

use ndarray::{Array2, ArrayD, ArrayViewD, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::composite::core::CompositeCore;
use crate::composite::errors::{CompositeError, CompositeResult};
use crate::composite::params::Params;
use crate::composite::submodel::{DensityKind, Submodel, SubmodelEntry};

/// Weighted finite mixture over submodels sharing one observation space.
#[derive(Clone, Debug)]
pub struct MixtureModel {
    core: CompositeCore<Vec<f64>>,
    width: usize,
}

impl MixtureModel {
    /// Build a mixture. Supplying `weights` freezes the instance.
    ///
    /// # Errors
    /// - [`CompositeError::NoSubmodels`] for an empty entry list.
    /// - [`CompositeError::WeightCountMismatch`] if `weights` does not hold
    ///   one weight per submodel.
    /// - [`CompositeError::MixtureWidthMismatch`] if entries disagree on
    ///   variate dimensionality.
    pub fn new(
        entries: Vec<SubmodelEntry>, weights: Option<Vec<f64>>,
    ) -> CompositeResult<MixtureModel> {
        let width = entries.first().map(|e| e.dims).ok_or(CompositeError::NoSubmodels)?;
        for (index, entry) in entries.iter().enumerate() {
            if entry.dims != width {
                return Err(CompositeError::MixtureWidthMismatch {
                    index,
                    expected: width,
                    actual: entry.dims,
                });
            }
        }
        if let Some(w) = &weights {
            if w.len() != entries.len() {
                return Err(CompositeError::WeightCountMismatch {
                    expected: entries.len(),
                    actual: w.len(),
                });
            }
        }
        let core = CompositeCore::new(entries, weights, false)?;
        Ok(MixtureModel { core, width })
    }

    /// Build a mixture marked frozen without storing weights, for components
    /// supplied pre-frozen.
    ///
    /// Density and sampling calls on such an instance still need weights
    /// from somewhere; since none are stored and frozen instances reject
    /// supplied ones, those calls report missing weights until a properly
    /// frozen copy is made.
    ///
    /// # Errors
    /// As [`MixtureModel::new`].
    pub fn new_frozen(entries: Vec<SubmodelEntry>) -> CompositeResult<MixtureModel> {
        let width = entries.first().map(|e| e.dims).ok_or(CompositeError::NoSubmodels)?;
        for (index, entry) in entries.iter().enumerate() {
            if entry.dims != width {
                return Err(CompositeError::MixtureWidthMismatch {
                    index,
                    expected: width,
                    actual: entry.dims,
                });
            }
        }
        let core = CompositeCore::new(entries, None, true)?;
        Ok(MixtureModel { core, width })
    }

    /// Whether this instance is frozen.
    pub fn frozen(&self) -> bool {
        self.core.frozen()
    }

    /// Number of mixture components.
    pub fn n_submodels(&self) -> usize {
        self.core.n_submodels()
    }

    /// Shared variate dimensionality of the components.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Produce a frozen copy: weights stored, every submodel frozen with its
    /// own mapping.
    ///
    /// # Errors
    /// - [`CompositeError::AlreadyFrozen`] if this instance is frozen.
    /// - Arity and submodel freezing errors per
    ///   [`CompositeCore::freeze_submodels`].
    pub fn freeze(&self, weights: &[f64], parameters: &[Params]) -> CompositeResult<MixtureModel> {
        if weights.len() != self.core.n_submodels() {
            return Err(CompositeError::WeightCountMismatch {
                expected: self.core.n_submodels(),
                actual: weights.len(),
            });
        }
        let frozen_entries = self.core.freeze_submodels(parameters)?;
        MixtureModel::new(frozen_entries, Some(weights.to_vec()))
    }

    /// Mixture density at `x`: the weighted sum of each component's density
    /// evaluated at the same `x`.
    ///
    /// A 1-D `x` over a univariate mixture is treated as a column of
    /// realisations.
    ///
    /// # Errors
    /// - Freeze-contract violations for `weights` or `parameters`.
    /// - [`CompositeError::MissingWeights`] when no weights are available.
    /// - [`CompositeError::SubmodelDensity`] wrapping component failures.
    pub fn pdf(
        &self, x: ArrayViewD<'_, f64>, weights: Option<&[f64]>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        let slot_params = self.check_submodel_parameters(parameters)?;
        let w = self.effective_weights(weights)?;
        let x = self.promote(x);
        let entries = self.core.entries();
        // The first component determines the output shape.
        let mut dens = self.component_density(0, &entries[0], x.view(), &slot_params[0])? * w[0];
        for (i, entry) in entries.iter().enumerate().skip(1) {
            let part = self.component_density(i, entry, x.view(), &slot_params[i])?;
            dens = dens + part * w[i];
        }
        Ok(dens)
    }

    /// Mixture log-density: the logarithm of [`MixtureModel::pdf`].
    ///
    /// Computed through the density itself — mixtures have no closed
    /// analytic log-sum-exp form here.
    pub fn logpdf(
        &self, x: ArrayViewD<'_, f64>, weights: Option<&[f64]>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        Ok(self.pdf(x, weights, parameters)?.mapv(f64::ln))
    }

    /// Draw `size` realisations as a `(size, width)` matrix.
    ///
    /// A categorical component label is drawn per output row from the
    /// mixing weights; every submodel is then sampled at the full `size`
    /// and the labelled component's value is selected per row.
    ///
    /// # Errors
    /// - Freeze-contract violations for `weights` or `parameters`.
    /// - [`CompositeError::MissingWeights`] when no weights are available.
    /// - [`CompositeError::InvalidWeights`] if the weights cannot drive a
    ///   categorical draw.
    /// - [`CompositeError::SubmodelRvs`] wrapping component failures.
    pub fn rvs(
        &self, size: usize, weights: Option<&[f64]>, parameters: Option<&[Params]>,
        rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        let slot_params = self.check_submodel_parameters(parameters)?;
        let w = self.effective_weights(weights)?;
        let chooser = WeightedIndex::new(&w)
            .map_err(|e| CompositeError::InvalidWeights { message: e.to_string() })?;
        let choices: Vec<usize> = (0..size).map(|_| chooser.sample(&mut *rng)).collect();
        let entries = self.core.entries();
        let mut component_draws = Vec::with_capacity(entries.len());
        for (i, (entry, pars)) in entries.iter().zip(&slot_params).enumerate() {
            let draws = entry.dist.sample(size, pars, rng).map_err(|e| {
                CompositeError::SubmodelRvs {
                    index: i,
                    param_names: pars.names(),
                    source: Box::new(e),
                }
            })?;
            component_draws.push(draws);
        }
        let mut out = Array2::zeros((size, self.width));
        for (row, &component) in choices.iter().enumerate() {
            out.row_mut(row).assign(&component_draws[component].row(row));
        }
        Ok(out)
    }

    fn component_density(
        &self, i: usize, entry: &SubmodelEntry, x: ArrayViewD<'_, f64>, pars: &Params,
    ) -> CompositeResult<ArrayD<f64>> {
        let ld = entry
            .dist
            .log_density(x, pars)
            .map_err(|e| CompositeError::SubmodelDensity { index: i, source: Box::new(e) })?;
        Ok(ld.mapv(f64::exp))
    }

    fn check_submodel_parameters(
        &self, parameters: Option<&[Params]>,
    ) -> CompositeResult<Vec<Params>> {
        let n = self.core.n_submodels();
        match (self.core.frozen(), parameters) {
            (true, Some(_)) => Err(CompositeError::FrozenParameters),
            (false, None) => Err(CompositeError::ParametersRequired),
            (true, None) => Ok(vec![Params::new(); n]),
            (false, Some(ps)) => {
                if ps.len() != n {
                    return Err(CompositeError::ParameterCountMismatch {
                        expected: n,
                        actual: ps.len(),
                    });
                }
                Ok(ps.to_vec())
            }
        }
    }

    fn effective_weights(&self, weights: Option<&[f64]>) -> CompositeResult<Vec<f64>> {
        let effective = self.core.validate_parameters(weights)?;
        let w = effective.ok_or(CompositeError::MissingWeights)?;
        if w.len() != self.core.n_submodels() {
            return Err(CompositeError::WeightCountMismatch {
                expected: self.core.n_submodels(),
                actual: w.len(),
            });
        }
        Ok(w.to_vec())
    }

    fn promote<'a>(&self, x: ArrayViewD<'a, f64>) -> ArrayViewD<'a, f64> {
        if self.width == 1 && x.ndim() == 1 {
            x.insert_axis(Axis(1))
        } else {
            x
        }
    }
}

impl Submodel for MixtureModel {
    fn kind(&self) -> DensityKind {
        if self.core.entries().iter().all(|e| e.dist.kind() == DensityKind::Discrete) {
            DensityKind::Discrete
        } else {
            DensityKind::Continuous
        }
    }

    fn param_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn log_density(&self, x: ArrayViewD<'_, f64>, params: &Params) -> CompositeResult<ArrayD<f64>> {
        if self.core.frozen() && !params.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        if !self.core.frozen() {
            return Err(CompositeError::ParametersRequired);
        }
        self.logpdf(x, None, None)
    }

    fn sample(
        &self, size: usize, params: &Params, rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        if self.core.frozen() && !params.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        if !self.core.frozen() {
            return Err(CompositeError::ParametersRequired);
        }
        self.rvs(size, None, None, rng)
    }

    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>> {
        if !self.core.frozen() {
            return Err(CompositeError::NotFreezable { model: "MixtureModel" });
        }
        if params.is_empty() {
            Ok(Arc::new(self.clone()))
        } else {
            Err(CompositeError::AlreadyFrozen)
        }
    }
}
