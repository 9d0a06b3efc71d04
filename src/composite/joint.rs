//! Joint distributions over independent submodels.
//!
//! Purpose
//! -------
//! Provide [`JointDist`], the product density over an ordered sequence of
//! statistically independent submodels, with three capabilities beyond plain
//! evaluation: per-submodel log-density overrides (so portions of the joint
//! density can be replaced by analytically profiled or marginalised
//! substitutes), subsetting via [`JointDist::split`], and freezing into a
//! parameter-free copy.
//!
//! Key behaviors
//! -------------
//! - Data arrives as one array whose trailing axis spans all submodels'
//!   variates; [`CompositeCore::split_data`] routes each chunk to its
//!   submodel. A 1-D input is treated as a single realisation row.
//! - [`JointDist::logpdf_list`] returns the per-submodel log-densities
//!   unsummed, supporting component-wise diagnostics; [`JointDist::logpdf`]
//!   sums them and [`JointDist::pdf`] multiplies the exponentials component
//!   by component, which preserves the numerical behavior of widely scaled
//!   submodels.
//! - When frozen, submodels without an override are evaluated with an empty
//!   parameter mapping — their density was fixed at freeze time — while
//!   overridden slots receive the stored freeze-time mappings. Effective
//!   parameter lists are built fresh; caller-supplied mappings are never
//!   mutated.
//! - Override slots are mutable only while unfrozen; `freeze` and `split`
//!   carry the table into the new instance.
//!
//! Invariants & assumptions
//! ------------------------
//! - The override table always holds exactly one slot per submodel.
//! - Stored parameters, when present, hold one mapping per submodel.
//! - Frozen instances are immutable; every state-changing path returns a new
//!   `JointDist`.
use std::sync::Arc;

use ndarray::{concatenate, Array2, ArrayD, ArrayViewD, Axis};
use rand::RngCore;

use crate::composite::core::CompositeCore;
use crate::composite::errors::{CompositeError, CompositeResult};
use crate::composite::params::Params;
use crate::composite::submodel::{DensityKind, LogDensityFn, Submodel, SubmodelEntry};

/// Product (independence) distribution over an ordered set of submodels.
///
/// Construct unfrozen with [`JointDist::new`], or frozen by supplying
/// per-submodel parameters there, or by calling [`JointDist::freeze`] on an
/// unfrozen instance.
#[derive(Clone)]
pub struct JointDist {
    core: CompositeCore<Vec<Params>>,
    overrides: Vec<Option<LogDensityFn>>,
}

impl std::fmt::Debug for JointDist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointDist")
            .field("entries", &self.core.entries())
            .field("frozen", &self.core.frozen())
            .field(
                "overrides",
                &self.overrides.iter().map(|o| o.is_some()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl JointDist {
    /// Build a joint distribution.
    ///
    /// Supplying `parameters` freezes the instance and assumes all entries
    /// are (or will behave as) frozen. `overrides` pre-populates the
    /// override table; `None` leaves every slot native.
    ///
    /// # Errors
    /// - [`CompositeError::NoSubmodels`] for an empty entry list.
    /// - [`CompositeError::ParameterCountMismatch`] /
    ///   [`CompositeError::OverrideCountMismatch`] on arity disagreements.
    pub fn new(
        entries: Vec<SubmodelEntry>, parameters: Option<Vec<Params>>,
        overrides: Option<Vec<Option<LogDensityFn>>>,
    ) -> CompositeResult<JointDist> {
        let n = entries.len();
        if let Some(ps) = &parameters {
            if ps.len() != n {
                return Err(CompositeError::ParameterCountMismatch {
                    expected: n,
                    actual: ps.len(),
                });
            }
        }
        let overrides = match overrides {
            None => vec![None; n],
            Some(table) => {
                if table.len() != n {
                    return Err(CompositeError::OverrideCountMismatch {
                        expected: n,
                        actual: table.len(),
                    });
                }
                table
            }
        };
        let core = CompositeCore::new(entries, parameters, false)?;
        Ok(JointDist { core, overrides })
    }

    /// Build a joint distribution marked frozen without storing parameters.
    ///
    /// For composites whose submodels are all supplied pre-frozen: density
    /// and sampling calls take no parameters, and every submodel is
    /// evaluated with an empty mapping.
    ///
    /// # Errors
    /// - [`CompositeError::NoSubmodels`] for an empty entry list.
    pub fn new_frozen(entries: Vec<SubmodelEntry>) -> CompositeResult<JointDist> {
        let n = entries.len();
        JointDist::from_parts(entries, None, true, vec![None; n])
    }

    fn from_parts(
        entries: Vec<SubmodelEntry>, parameters: Option<Vec<Params>>, force_frozen: bool,
        overrides: Vec<Option<LogDensityFn>>,
    ) -> CompositeResult<JointDist> {
        let core = CompositeCore::new(entries, parameters, force_frozen)?;
        Ok(JointDist { core, overrides })
    }

    /// Whether this instance is frozen.
    pub fn frozen(&self) -> bool {
        self.core.frozen()
    }

    /// Number of submodels.
    pub fn n_submodels(&self) -> usize {
        self.core.n_submodels()
    }

    /// Total variate dimensionality along the trailing data axis.
    pub fn total_dims(&self) -> usize {
        self.core.total_dims()
    }

    /// Split `x` along its trailing axis into per-submodel chunks.
    ///
    /// # Errors
    /// See [`CompositeCore::split_data`].
    pub fn split_data(&self, x: ArrayViewD<'_, f64>) -> CompositeResult<Vec<ArrayD<f64>>> {
        self.core.split_data(x)
    }

    /// Build a new `JointDist` from the submodels at the given indices,
    /// carrying over their dimensionalities, stored parameters (when
    /// frozen), and override slots.
    ///
    /// # Errors
    /// - [`CompositeError::SubmodelIndexOutOfRange`] for a bad index.
    /// - [`CompositeError::NoSubmodels`] for an empty selection.
    pub fn split(&self, selection: &[usize]) -> CompositeResult<JointDist> {
        let n = self.core.n_submodels();
        let mut entries = Vec::with_capacity(selection.len());
        let mut overrides = Vec::with_capacity(selection.len());
        for &i in selection {
            if i >= n {
                return Err(CompositeError::SubmodelIndexOutOfRange { index: i, count: n });
            }
            entries.push(self.core.entries()[i].clone());
            overrides.push(self.overrides[i].clone());
        }
        let parameters = if self.core.frozen() {
            self.core
                .stored_params()
                .map(|ps| selection.iter().map(|&i| ps[i].clone()).collect())
        } else {
            None
        };
        JointDist::from_parts(entries, parameters, self.core.frozen(), overrides)
    }

    /// Produce a frozen copy: every submodel is frozen with its own mapping
    /// and the parameters are stored, so density and sampling calls take no
    /// further parameters. The override table carries over.
    ///
    /// # Errors
    /// - [`CompositeError::AlreadyFrozen`] if this instance is frozen.
    /// - Arity and submodel freezing errors per
    ///   [`CompositeCore::freeze_submodels`].
    pub fn freeze(&self, parameters: &[Params]) -> CompositeResult<JointDist> {
        let frozen_entries = self.core.freeze_submodels(parameters)?;
        JointDist::from_parts(
            frozen_entries,
            Some(parameters.to_vec()),
            false,
            self.overrides.clone(),
        )
    }

    /// Evaluate submodel `i`'s native log-density at `x`.
    ///
    /// The continuous/discrete distinction lives in the submodel contract,
    /// fixed when the submodel was built, so no density-form probing happens
    /// here.
    ///
    /// # Errors
    /// - [`CompositeError::SubmodelIndexOutOfRange`] for a bad index.
    /// - [`CompositeError::FrozenParameters`] if frozen and `parameters` is
    ///   non-empty.
    /// - [`CompositeError::ParametersRequired`] if unfrozen and `parameters`
    ///   is empty.
    /// - [`CompositeError::SubmodelDensity`] wrapping any evaluation failure.
    pub fn submodel_logpdf(
        &self, i: usize, x: ArrayViewD<'_, f64>, parameters: &Params,
    ) -> CompositeResult<ArrayD<f64>> {
        let n = self.core.n_submodels();
        let entry = self
            .core
            .entries()
            .get(i)
            .ok_or(CompositeError::SubmodelIndexOutOfRange { index: i, count: n })?;
        if self.core.frozen() && !parameters.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        if !self.core.frozen() && parameters.is_empty() {
            return Err(CompositeError::ParametersRequired);
        }
        entry
            .dist
            .log_density(x, parameters)
            .map_err(|e| CompositeError::SubmodelDensity { index: i, source: Box::new(e) })
    }

    /// Evaluate submodel `i`'s native density at `x`: the exponential of
    /// [`JointDist::submodel_logpdf`].
    ///
    /// # Errors
    /// As [`JointDist::submodel_logpdf`].
    pub fn submodel_pdf(
        &self, i: usize, x: ArrayViewD<'_, f64>, parameters: &Params,
    ) -> CompositeResult<ArrayD<f64>> {
        Ok(self.submodel_logpdf(i, x, parameters)?.mapv(f64::exp))
    }

    /// Per-submodel log-densities at `x`, unsummed.
    ///
    /// `x`'s trailing axis spans all submodels; a 1-D `x` is treated as one
    /// realisation row. Overridden slots are evaluated through their
    /// substitute with the slot's effective mapping; when frozen, slots
    /// without an override get an empty mapping (their density was fixed at
    /// freeze time and must not be re-evaluated with fresh parameters).
    ///
    /// # Errors
    /// - Freeze-contract and arity errors as in [`JointDist::submodel_logpdf`].
    /// - [`CompositeError::DataWidthMismatch`] if the trailing axis does not
    ///   match the declared total dimensionality.
    pub fn logpdf_list(
        &self, x: ArrayViewD<'_, f64>, parameters: Option<&[Params]>,
    ) -> CompositeResult<Vec<ArrayD<f64>>> {
        let effective = self.core.validate_parameters(parameters)?;
        let promoted = if x.ndim() == 1 { x.insert_axis(Axis(0)) } else { x };
        let chunks = self.core.split_data(promoted)?;
        let n = self.core.n_submodels();
        let mut slot_params: Vec<Params> = match effective {
            Some(ps) => {
                if ps.len() != n {
                    return Err(CompositeError::ParameterCountMismatch {
                        expected: n,
                        actual: ps.len(),
                    });
                }
                ps.to_vec()
            }
            None => vec![Params::new(); n],
        };
        if self.core.frozen() {
            for (slot, replacement) in slot_params.iter_mut().zip(&self.overrides) {
                if replacement.is_none() {
                    *slot = Params::new();
                }
            }
        }
        let mut out = Vec::with_capacity(n);
        for (i, chunk) in chunks.iter().enumerate() {
            let ld = match &self.overrides[i] {
                Some(substitute) => substitute.as_ref()(chunk.view(), &slot_params[i])
                    .map_err(|e| CompositeError::SubmodelDensity { index: i, source: Box::new(e) })?,
                None => self.submodel_logpdf(i, chunk.view(), &slot_params[i])?,
            };
            out.push(ld);
        }
        Ok(out)
    }

    /// Joint log-density: the element-wise sum of [`JointDist::logpdf_list`].
    pub fn logpdf(
        &self, x: ArrayViewD<'_, f64>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        let list = self.logpdf_list(x, parameters)?;
        let mut total = list[0].clone();
        for component in &list[1..] {
            check_component_shape(&total, component)?;
            total += component;
        }
        Ok(total)
    }

    /// Joint density, computed multiplicatively: the exponential of each
    /// component's log-density (overridden or not), multiplied across
    /// submodels. Mathematically `exp(logpdf)`, kept multiplicative to
    /// preserve numerical behavior when submodel scales differ widely.
    pub fn pdf(
        &self, x: ArrayViewD<'_, f64>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        let list = self.logpdf_list(x, parameters)?;
        let mut product = list[0].mapv(f64::exp);
        for component in &list[1..] {
            check_component_shape(&product, component)?;
            product = product * component.mapv(f64::exp);
        }
        Ok(product)
    }

    /// Replace (or clear, with `None`) the log-density override for submodel
    /// `i`.
    ///
    /// # Errors
    /// - [`CompositeError::FrozenOverride`] on a frozen instance.
    /// - [`CompositeError::SubmodelIndexOutOfRange`] for a bad index.
    pub fn set_submodel_logpdf(
        &mut self, i: usize, substitute: Option<LogDensityFn>,
    ) -> CompositeResult<()> {
        if self.core.frozen() {
            return Err(CompositeError::FrozenOverride);
        }
        let n = self.core.n_submodels();
        if i >= n {
            return Err(CompositeError::SubmodelIndexOutOfRange { index: i, count: n });
        }
        self.overrides[i] = substitute;
        Ok(())
    }

    /// Replace the whole override table. Use `None` in slots that should
    /// keep their native density.
    ///
    /// # Errors
    /// - [`CompositeError::FrozenOverride`] on a frozen instance.
    /// - [`CompositeError::OverrideCountMismatch`] on arity disagreement.
    pub fn set_logpdf(&mut self, table: Vec<Option<LogDensityFn>>) -> CompositeResult<()> {
        if self.core.frozen() {
            return Err(CompositeError::FrozenOverride);
        }
        let n = self.core.n_submodels();
        if table.len() != n {
            return Err(CompositeError::OverrideCountMismatch { expected: n, actual: table.len() });
        }
        self.overrides = table;
        Ok(())
    }

    /// Draw `size` joint realisations as a `(size, total_dims)` matrix.
    ///
    /// Every submodel is sampled independently at `size` and the results are
    /// concatenated along the variate axis. Frozen instances ignore
    /// `parameters` entirely (all sampling behaviour was fixed at freeze
    /// time); unfrozen instances require one mapping per submodel.
    ///
    /// # Errors
    /// - [`CompositeError::ParametersRequired`] /
    ///   [`CompositeError::ParameterCountMismatch`] for unfrozen instances.
    /// - [`CompositeError::SubmodelRvs`] wrapping a failed submodel draw
    ///   with the submodel index and the parameter names attempted.
    pub fn rvs(
        &self, size: usize, parameters: Option<&[Params]>, rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        let n = self.core.n_submodels();
        let slot_params: Vec<Params> = if self.core.frozen() {
            vec![Params::new(); n]
        } else {
            let ps = parameters.ok_or(CompositeError::ParametersRequired)?;
            if ps.len() != n {
                return Err(CompositeError::ParameterCountMismatch {
                    expected: n,
                    actual: ps.len(),
                });
            }
            ps.to_vec()
        };
        let mut parts: Vec<Array2<f64>> = Vec::with_capacity(n);
        for (i, (entry, pars)) in self.core.entries().iter().zip(&slot_params).enumerate() {
            let draws = entry.dist.sample(size, pars, rng).map_err(|e| {
                CompositeError::SubmodelRvs {
                    index: i,
                    param_names: pars.names(),
                    source: Box::new(e),
                }
            })?;
            parts.push(draws);
        }
        let views: Vec<_> = parts.iter().map(|a| a.view()).collect();
        Ok(concatenate(Axis(1), &views)?)
    }
}

impl Submodel for JointDist {
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
        self.logpdf(x, None)
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
        self.rvs(size, None, rng)
    }

    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>> {
        if !self.core.frozen() {
            return Err(CompositeError::NotFreezable { model: "JointDist" });
        }
        if params.is_empty() {
            Ok(Arc::new(self.clone()))
        } else {
            Err(CompositeError::AlreadyFrozen)
        }
    }
}

fn check_component_shape(reference: &ArrayD<f64>, component: &ArrayD<f64>) -> CompositeResult<()> {
    if reference.shape() != component.shape() {
        return Err(CompositeError::Shape {
            message: format!(
                "submodel log-density shapes disagree: {:?} vs {:?}",
                reference.shape(),
                component.shape()
            ),
        });
    }
    Ok(())
}
