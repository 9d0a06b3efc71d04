//! composite — freezable distributions built from lists of submodels.
//!
//! Purpose
//! -------
//! Provide the composition layer of the crate: joint distributions over
//! independent submodels, weighted and normalised-power mixtures, and
//! reparameterisation wrappers, all built on one shared capability contract
//! and one shared piece of frozen/unfrozen bookkeeping. Atomic distributions
//! themselves come from `statrs`; this module only composes them.
//!
//! Key behaviors
//! -------------
//! - [`submodel`] defines the capability contract ([`Submodel`],
//!   [`DensityKind`], [`SubmodelEntry`], [`LogDensityFn`]) that atoms and
//!   composites alike implement, which is what lets composites nest.
//! - [`atoms`] adapts `statrs` distributions to the contract, split into
//!   freezable families ([`ScalarFamily`]) and pre-frozen instances
//!   ([`FrozenScalar`]).
//! - [`core`] carries the shared state: entries with declared variate
//!   dimensionalities, optional own-parameters, the frozen flag, and the
//!   dimension-aware trailing-axis split.
//! - [`joint`] implements the independence product ([`JointDist`]) with
//!   per-submodel log-density overrides and subsetting; [`mixture`] the
//!   weighted sum ([`MixtureModel`]); [`power`] the normalised
//!   product-of-powers variant ([`PowerMixture`]); [`trans`] the
//!   reparameterisation wrapper ([`TransDist`]).
//! - [`errors`] centralizes [`CompositeError`] and [`CompositeResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A composite is either frozen (parameters fixed, calls take none) or
//!   unfrozen (parameters required at every call); re-freezing is illegal.
//! - Parameter structures are ordered, one mapping per submodel, and are
//!   never mutated in place by the library.
//! - The trailing axis of realisation data indexes variate components, in
//!   submodel order.
//!
//! Conventions
//! -----------
//! - This layer performs no I/O and no logging; failures surface as
//!   [`CompositeError`] values carrying their context.
//! - RNGs are caller-supplied; nothing here seeds or stores random state.
pub mod atoms;
pub mod core;
pub mod errors;
pub mod joint;
pub mod mixture;
pub mod params;
pub mod power;
pub mod submodel;
pub mod trans;

pub use atoms::{FrozenScalar, ScalarFamily, ScalarKernel};
pub use self::core::CompositeCore;
pub use errors::{CompositeError, CompositeResult};
pub use joint::JointDist;
pub use mixture::MixtureModel;
pub use params::Params;
pub use power::PowerMixture;
pub use submodel::{DensityKind, LogDensityFn, Submodel, SubmodelEntry};
pub use trans::{ParamTransform, TransDist};
