//! Adapters placing `statrs` distributions behind the submodel contract.
//!
//! Purpose
//! -------
//! Bridge scalar `statrs` distributions into the [`Submodel`] capability
//! contract. Two adapter forms exist:
//!
//! - [`ScalarFamily`]: an *unfrozen* family — declared parameter names plus a
//!   factory building the concrete distribution from a [`Params`] mapping on
//!   every call. Freezable: `freeze` runs the factory once and captures the
//!   result.
//! - [`FrozenScalar`]: a *pre-frozen* distribution — a concrete kernel with
//!   all parameters fixed. Rejects any non-empty parameter mapping.
//!
//! Key behaviors
//! -------------
//! - The continuous/discrete split is captured at construction via
//!   [`DensityKind`]; evaluation never probes which form a distribution
//!   supports.
//! - Discrete evaluation maps non-integer or negative points to `-inf` mass
//!   rather than rounding them onto the support.
//! - Sampling draws one value per requested realisation into a `(size, 1)`
//!   matrix, matching the trailing-axis conventions of the composites.
//!
//! Invariants & assumptions
//! ------------------------
//! - Factories must validate their own parameters; `statrs` constructor
//!   errors convert into [`CompositeError::AtomConstruction`] via `From`.
//! - Kernels are immutable once built; the same kernel may be shared across
//!   threads behind an `Arc`.
use std::sync::Arc;

use ndarray::{Array2, ArrayD, ArrayViewD, Axis};
use rand::distributions::Distribution;
use rand::RngCore;
use statrs::distribution::{Continuous, Discrete};

use crate::composite::errors::{CompositeError, CompositeResult};
use crate::composite::params::Params;
use crate::composite::submodel::{DensityKind, Submodel};
use crate::structure::errors::StructureError;

/// Object-safe view over one concrete scalar distribution: log-density at a
/// point and a single draw.
pub trait ScalarKernel: Send + Sync {
    /// Log-density (or log-mass) at `x`.
    fn ln_density(&self, x: f64) -> f64;

    /// One random draw.
    fn draw(&self, rng: &mut dyn RngCore) -> f64;
}

struct ContinuousKernel<D> {
    dist: D,
}

impl<D> ScalarKernel for ContinuousKernel<D>
where
    D: Continuous<f64, f64> + Distribution<f64> + Send + Sync,
{
    fn ln_density(&self, x: f64) -> f64 {
        self.dist.ln_pdf(x)
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        self.dist.sample(rng)
    }
}

struct DiscreteKernel<D> {
    dist: D,
}

impl<D> ScalarKernel for DiscreteKernel<D>
where
    D: Discrete<u64, f64> + Distribution<f64> + Send + Sync,
{
    fn ln_density(&self, x: f64) -> f64 {
        // Off-support points carry zero mass.
        if !x.is_finite() || x < 0.0 || x.fract() != 0.0 {
            f64::NEG_INFINITY
        } else {
            self.dist.ln_pmf(x as u64)
        }
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        self.dist.sample(rng)
    }
}

type KernelFactory = Arc<dyn Fn(&Params) -> CompositeResult<Arc<dyn ScalarKernel>> + Send + Sync>;

/// An unfrozen scalar distribution family: declared parameter names plus a
/// factory from parameter mappings to concrete kernels.
///
/// Families are freezable: [`Submodel::freeze`] runs the factory once and
/// returns a [`FrozenScalar`] capturing the result.
#[derive(Clone)]
pub struct ScalarFamily {
    kind: DensityKind,
    args: Vec<String>,
    build: KernelFactory,
}

impl std::fmt::Debug for ScalarFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarFamily")
            .field("kind", &self.kind)
            .field("args", &self.args)
            .finish()
    }
}

impl ScalarFamily {
    /// A continuous family built from a `statrs` constructor closure.
    pub fn continuous<D, F>(args: &[&str], factory: F) -> ScalarFamily
    where
        D: Continuous<f64, f64> + Distribution<f64> + Send + Sync + 'static,
        F: Fn(&Params) -> CompositeResult<D> + Send + Sync + 'static,
    {
        ScalarFamily {
            kind: DensityKind::Continuous,
            args: args.iter().map(|s| s.to_string()).collect(),
            build: Arc::new(move |params| {
                let dist = factory(params)?;
                Ok(Arc::new(ContinuousKernel { dist }) as Arc<dyn ScalarKernel>)
            }),
        }
    }

    /// A discrete family built from a `statrs` constructor closure.
    pub fn discrete<D, F>(args: &[&str], factory: F) -> ScalarFamily
    where
        D: Discrete<u64, f64> + Distribution<f64> + Send + Sync + 'static,
        F: Fn(&Params) -> CompositeResult<D> + Send + Sync + 'static,
    {
        ScalarFamily {
            kind: DensityKind::Discrete,
            args: args.iter().map(|s| s.to_string()).collect(),
            build: Arc::new(move |params| {
                let dist = factory(params)?;
                Ok(Arc::new(DiscreteKernel { dist }) as Arc<dyn ScalarKernel>)
            }),
        }
    }
}

impl Submodel for ScalarFamily {
    fn kind(&self) -> DensityKind {
        self.kind
    }

    fn param_names(&self) -> Vec<String> {
        self.args.clone()
    }

    fn log_density(&self, x: ArrayViewD<'_, f64>, params: &Params) -> CompositeResult<ArrayD<f64>> {
        let kernel = (self.build)(params)?;
        scalar_log_density(kernel.as_ref(), x)
    }

    fn sample(
        &self, size: usize, params: &Params, rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        let kernel = (self.build)(params)?;
        scalar_sample(kernel.as_ref(), size, rng)
    }

    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>> {
        let kernel = (self.build)(params)?;
        Ok(Arc::new(FrozenScalar { kind: self.kind, kernel }))
    }
}

/// A pre-frozen scalar distribution: a concrete kernel with all parameters
/// fixed at construction.
#[derive(Clone)]
pub struct FrozenScalar {
    kind: DensityKind,
    kernel: Arc<dyn ScalarKernel>,
}

impl std::fmt::Debug for FrozenScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrozenScalar").field("kind", &self.kind).finish()
    }
}

impl FrozenScalar {
    /// Wrap an already-constructed continuous `statrs` distribution.
    pub fn continuous<D>(dist: D) -> FrozenScalar
    where
        D: Continuous<f64, f64> + Distribution<f64> + Send + Sync + 'static,
    {
        FrozenScalar { kind: DensityKind::Continuous, kernel: Arc::new(ContinuousKernel { dist }) }
    }

    /// Wrap an already-constructed discrete `statrs` distribution.
    pub fn discrete<D>(dist: D) -> FrozenScalar
    where
        D: Discrete<u64, f64> + Distribution<f64> + Send + Sync + 'static,
    {
        FrozenScalar { kind: DensityKind::Discrete, kernel: Arc::new(DiscreteKernel { dist }) }
    }
}

impl Submodel for FrozenScalar {
    fn kind(&self) -> DensityKind {
        self.kind
    }

    fn param_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn log_density(&self, x: ArrayViewD<'_, f64>, params: &Params) -> CompositeResult<ArrayD<f64>> {
        if !params.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        scalar_log_density(self.kernel.as_ref(), x)
    }

    fn sample(
        &self, size: usize, params: &Params, rng: &mut dyn RngCore,
    ) -> CompositeResult<Array2<f64>> {
        if !params.is_empty() {
            return Err(CompositeError::FrozenParameters);
        }
        scalar_sample(self.kernel.as_ref(), size, rng)
    }

    fn freeze(&self, params: &Params) -> CompositeResult<Arc<dyn Submodel>> {
        if params.is_empty() {
            Ok(Arc::new(self.clone()))
        } else {
            Err(CompositeError::AlreadyFrozen)
        }
    }
}

fn scalar_log_density(
    kernel: &dyn ScalarKernel, x: ArrayViewD<'_, f64>,
) -> CompositeResult<ArrayD<f64>> {
    if x.ndim() == 0 {
        return Err(StructureError::NoVariateAxis.into());
    }
    let last = Axis(x.ndim() - 1);
    let width = x.len_of(last);
    if width != 1 {
        return Err(CompositeError::DataWidthMismatch { expected: 1, actual: width });
    }
    Ok(x.index_axis(last, 0).map(|&v| kernel.ln_density(v)))
}

fn scalar_sample(
    kernel: &dyn ScalarKernel, size: usize, rng: &mut dyn RngCore,
) -> CompositeResult<Array2<f64>> {
    let mut draws = Vec::with_capacity(size);
    for _ in 0..size {
        draws.push(kernel.draw(rng));
    }
    Ok(Array2::from_shape_vec((size, 1), draws)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::{Normal, Poisson};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Continuous and discrete log-density evaluation through the adapters,
    //   including the off-support convention for discrete points.
    // - Freezing a family into a pre-frozen scalar and the pre-frozen
    //   parameter rejection.
    // - Sampling shapes.
    // -------------------------------------------------------------------------

    fn normal_family() -> ScalarFamily {
        ScalarFamily::continuous(&["loc", "scale"], |p: &Params| {
            Ok(Normal::new(p.require("loc")?, p.require("scale")?)?)
        })
    }

    #[test]
    // Purpose
    // -------
    // Verify a continuous family evaluates the statrs log-pdf element-wise
    // and collapses the trailing axis.
    //
    // Given
    // -----
    // - A normal family with loc = 0, scale = 1 and x of shape (3, 1).
    //
    // Expect
    // ------
    // - Output shape (3,) with values matching `Normal::ln_pdf`.
    fn continuous_family_matches_statrs_ln_pdf() {
        let family = normal_family();
        let params = Params::from_pairs(&[("loc", 0.0), ("scale", 1.0)]);
        let x = array![[0.0], [1.0], [-2.0]].into_dyn();

        let ld = family.log_density(x.view(), &params).expect("valid parameters evaluate");

        let reference = Normal::new(0.0, 1.0).unwrap();
        assert_eq!(ld.shape(), &[3]);
        for (v, point) in ld.iter().zip([0.0, 1.0, -2.0]) {
            assert!((v - reference.ln_pdf(point)).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify discrete evaluation maps off-support points to `-inf` and
    // on-support points to the statrs log-pmf.
    //
    // Given
    // -----
    // - A Poisson family with rate 2 and x = [[2.0], [2.5], [-1.0]].
    //
    // Expect
    // ------
    // - ln pmf(2) at the first slot; `-inf` at the non-integer and negative
    //   slots.
    fn discrete_family_maps_off_support_to_neg_infinity() {
        let family = ScalarFamily::discrete(&["rate"], |p: &Params| {
            Ok(Poisson::new(p.require("rate")?)?)
        });
        let params = Params::new().with("rate", 2.0);
        let x = array![[2.0], [2.5], [-1.0]].into_dyn();

        let ld = family.log_density(x.view(), &params).expect("valid parameters evaluate");

        let reference = Poisson::new(2.0).unwrap();
        assert!((ld[[0]] - reference.ln_pmf(2)).abs() < 1e-12);
        assert_eq!(ld[[1]], f64::NEG_INFINITY);
        assert_eq!(ld[[2]], f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Verify freezing captures the factory result: the frozen scalar
    // evaluates identically with an empty mapping and rejects parameters.
    //
    // Given
    // -----
    // - The normal family frozen at loc = 1, scale = 2.
    //
    // Expect
    // ------
    // - Frozen evaluation with empty params matches the unfrozen family at
    //   the same parameters.
    // - Supplying parameters to the frozen scalar yields
    //   `FrozenParameters`; re-freezing with parameters yields
    //   `AlreadyFrozen`.
    fn freeze_captures_parameters_and_rejects_new_ones() {
        let family = normal_family();
        let params = Params::from_pairs(&[("loc", 1.0), ("scale", 2.0)]);
        let x = array![[0.5], [1.5]].into_dyn();

        let frozen = family.freeze(&params).expect("valid parameters freeze");

        let unfrozen_ld = family.log_density(x.view(), &params).unwrap();
        let frozen_ld = frozen.log_density(x.view(), &Params::new()).unwrap();
        assert_eq!(unfrozen_ld, frozen_ld);
        assert_eq!(
            frozen.log_density(x.view(), &params).unwrap_err(),
            CompositeError::FrozenParameters
        );
        assert_eq!(frozen.freeze(&params).unwrap_err(), CompositeError::AlreadyFrozen);
    }

    #[test]
    // Purpose
    // -------
    // Verify sampling produces a (size, 1) matrix of finite draws.
    //
    // Given
    // -----
    // - A pre-frozen standard normal and a seeded RNG.
    //
    // Expect
    // ------
    // - Shape (16, 1), all entries finite.
    fn sampling_produces_column_matrix() {
        let frozen = FrozenScalar::continuous(Normal::new(0.0, 1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(7);

        let draws = frozen.sample(16, &Params::new(), &mut rng).expect("sampling succeeds");

        assert_eq!(draws.shape(), &[16, 1]);
        assert!(draws.iter().all(|v| v.is_finite()));
    }
}
