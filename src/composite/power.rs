//! Normalised power mixtures of continuous univariate submodels.
//!
//! Purpose
//! -------
//! Provide [`PowerMixture`], the geometric counterpart of the weighted-sum
//! mixture: component densities are combined as a product of powers,
//! `∏ f_i(x)^{w_i}`, and renormalised to integrate to one. The normalisation
//! constant has no closed form, so it is computed numerically — once, at
//! construction — by integrating the unnormalised density over a
//! caller-declared domain with a caller-supplied integrator.
//!
//! Key behaviors
//! -------------
//! - Only continuous, univariate submodels are accepted, checked at
//!   construction; submodels are evaluated with empty parameter mappings and
//!   are expected pre-frozen.
//! - `logpdf` is the weighted sum of component *log*-densities minus the log
//!   of the stored normalisation constant.
//! - Supplying fresh weights or parameters at evaluation time changes only
//!   the unnormalised part: the constant is **not** recomputed. Dynamic
//!   renormalisation under changing parameters is an open problem and is
//!   deliberately not implemented.
//! - Sampling is deliberately unsupported and fails with a clear error.
//!
//! Invariants & assumptions
//! ------------------------
//! - The integrator is a pure collaborator: given a scalar density and the
//!   domain endpoints it returns the integral estimate. Its accuracy is the
//!   caller's responsibility.
//! - The stored constant is finite and strictly positive; construction
//!   fails otherwise.
use std::sync::Arc;

use ndarray::{arr1, Array2, ArrayD, ArrayViewD, Axis};
use rand::RngCore;

use crate::composite::errors::{CompositeError, CompositeResult};
use crate::composite::params::Params;
use crate::composite::submodel::{DensityKind, Submodel, SubmodelEntry};

/// Normalised product-of-powers mixture over continuous univariate
/// submodels.
#[derive(Clone, Debug)]
pub struct PowerMixture {
    entries: Vec<SubmodelEntry>,
    weights: Vec<f64>,
    domain: (f64, f64),
    norm: f64,
}

impl PowerMixture {
    /// Build a power mixture and compute its normalisation constant.
    ///
    /// `integrator` receives the unnormalised scalar density and the domain
    /// endpoints and must return the integral estimate. It is invoked
    /// exactly once, here.
    ///
    /// # Errors
    /// - [`CompositeError::NoSubmodels`] /
    ///   [`CompositeError::WeightCountMismatch`] on arity problems.
    /// - [`CompositeError::ContinuousOnly`] /
    ///   [`CompositeError::UnivariateOnly`] for unsupported submodels.
    /// - [`CompositeError::SubmodelDensity`] if the combined density cannot
    ///   be evaluated on the domain.
    /// - [`CompositeError::InvalidNormalisation`] if the integral estimate
    ///   is non-finite or non-positive.
    pub fn new<I>(
        entries: Vec<SubmodelEntry>, weights: Vec<f64>, domain: (f64, f64), integrator: I,
    ) -> CompositeResult<PowerMixture>
    where
        I: Fn(&dyn Fn(f64) -> f64, f64, f64) -> f64,
    {
        if entries.is_empty() {
            return Err(CompositeError::NoSubmodels);
        }
        if weights.len() != entries.len() {
            return Err(CompositeError::WeightCountMismatch {
                expected: entries.len(),
                actual: weights.len(),
            });
        }
        for (index, entry) in entries.iter().enumerate() {
            if entry.dist.kind() == DensityKind::Discrete {
                return Err(CompositeError::ContinuousOnly { index });
            }
            if entry.dims != 1 {
                return Err(CompositeError::UnivariateOnly { index, dims: entry.dims });
            }
        }
        let mut model = PowerMixture { entries, weights, domain, norm: 1.0 };
        // Surface evaluation failures before handing the density to the
        // integrator, which cannot report them.
        model.unnorm_logpdf_at(0.5 * (domain.0 + domain.1))?;
        let unnorm = |x: f64| model.unnorm_logpdf_at(x).map(f64::exp).unwrap_or(f64::NAN);
        let norm = integrator(&unnorm, domain.0, domain.1);
        if !norm.is_finite() || norm <= 0.0 {
            return Err(CompositeError::InvalidNormalisation { value: norm });
        }
        model.norm = norm;
        Ok(model)
    }

    /// The stored normalisation constant.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// The integration domain declared at construction.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Log-density: `Σ wᵢ · log fᵢ(x) − log Z`.
    ///
    /// `weights` and `parameters` default to the stored weights and empty
    /// mappings. Overriding them does **not** recompute `Z`; the result is
    /// then normalised against the construction-time constant.
    ///
    /// # Errors
    /// - [`CompositeError::WeightCountMismatch`] /
    ///   [`CompositeError::ParameterCountMismatch`] on arity problems.
    /// - [`CompositeError::SubmodelDensity`] wrapping component failures.
    pub fn logpdf(
        &self, x: ArrayViewD<'_, f64>, weights: Option<&[f64]>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        let n = self.entries.len();
        let w: Vec<f64> = match weights {
            Some(w) => {
                if w.len() != n {
                    return Err(CompositeError::WeightCountMismatch {
                        expected: n,
                        actual: w.len(),
                    });
                }
                w.to_vec()
            }
            None => self.weights.clone(),
        };
        let pars: Vec<Params> = match parameters {
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
        let x = if x.ndim() == 1 { x.insert_axis(Axis(1)) } else { x };
        let mut total = self.component_log_density(0, x.view(), &pars[0])? * w[0];
        for i in 1..n {
            let part = self.component_log_density(i, x.view(), &pars[i])?;
            total = total + part * w[i];
        }
        Ok(total - self.norm.ln())
    }

    /// Density: the exponential of [`PowerMixture::logpdf`].
    pub fn pdf(
        &self, x: ArrayViewD<'_, f64>, weights: Option<&[f64]>, parameters: Option<&[Params]>,
    ) -> CompositeResult<ArrayD<f64>> {
        Ok(self.logpdf(x, weights, parameters)?.mapv(f64::exp))
    }

    /// Sampling is deliberately unsupported for this distribution variant.
    ///
    /// # Errors
    /// Always [`CompositeError::SamplingUnsupported`].
    pub fn rvs(&self, _size: usize) -> CompositeResult<Array2<f64>> {
        Err(CompositeError::SamplingUnsupported { model: "PowerMixture" })
    }

    fn component_log_density(
        &self, i: usize, x: ArrayViewD<'_, f64>, pars: &Params,
    ) -> CompositeResult<ArrayD<f64>> {
        self.entries[i]
            .dist
            .log_density(x, pars)
            .map_err(|e| CompositeError::SubmodelDensity { index: i, source: Box::new(e) })
    }

    fn unnorm_logpdf_at(&self, x: f64) -> CompositeResult<f64> {
        let point = arr1(&[x]).into_dyn();
        let mut total = 0.0;
        for (i, w) in self.weights.iter().enumerate() {
            let ld = self.component_log_density(i, point.view(), &Params::new())?;
            total += w * ld.sum();
        }
        Ok(total)
    }
}

impl Submodel for PowerMixture {
    fn kind(&self) -> DensityKind {
        DensityKind::Continuous
    }

    fn param_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn log_density(&self, x: ArrayViewD<'_, f64>, params: &Params) -> CompositeResult<ArrayD<f64>> {
        if !params.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        self.logpdf(x, None, None)
    }

    fn sample(
        &self, _size: usize, _params: &Params, _rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        Err(CompositeError::SamplingUnsupported { model: "PowerMixture" })
    }

    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>> {
        if params.is_empty() {
            Ok(Arc::new(self.clone()))
        } else {
            Err(CompositeError::AlreadyFrozen)
        }
    }
}
