//! compdist — composite probability distributions over statrs primitives.
//!
//! Purpose
//! -------
//! Build joint distributions over independent components, finite mixtures,
//! and reparameterised distributions out of simpler distribution objects,
//! without hard-coding any distributional family. The crate supplies the
//! generic composition machinery; `statrs` supplies the atoms, placed behind
//! a narrow capability contract by the adapters in [`composite::atoms`].
//!
//! Key behaviors
//! -------------
//! - [`structure`] holds the shape-generic foundation: nested trees of
//!   `ndarray` arrays mirroring model composition, lock-step structural
//!   recursion over them, and realisation slicing.
//! - [`composite`] holds the distributions: [`JointDist`] (independence
//!   products with per-submodel density overrides), [`MixtureModel`]
//!   (weighted sums with categorical sampling), [`PowerMixture`]
//!   (normalised products of powers), and [`TransDist`]
//!   (reparameterisations), all freezable and all usable as submodels of
//!   one another.
//!
//! Invariants & assumptions
//! ------------------------
//! - The trailing axis of every data array indexes variate components;
//!   leading axes index realisations.
//! - Frozen composites take no parameters and reject supplied ones;
//!   unfrozen composites require parameters at every call.
//! - All work is synchronous, in-memory numeric computation; the crate
//!   performs no I/O and holds no global state (RNGs are caller-supplied).
//!
//! Downstream usage
//! ----------------
//! - Typical flow: wrap `statrs` constructors in
//!   [`ScalarFamily`](composite::ScalarFamily) values, assemble them into a
//!   [`JointDist`] or [`MixtureModel`], freeze with concrete parameters,
//!   then evaluate `logpdf`/`pdf` or draw with `rvs`.
//! - Import the everyday types through [`prelude`].
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests beside each module and by
//!   the end-to-end suite in `tests/`, which checks density factorization,
//!   mixture normalisation, freeze-contract violations, override round
//!   trips, and distributional agreement of reparameterised sampling.

pub mod composite;
pub mod structure;

pub use composite::{JointDist, MixtureModel, PowerMixture, TransDist};

/// Everyday imports for building and evaluating composite distributions.
pub mod prelude {
    pub use crate::composite::{
        CompositeError, CompositeResult, DensityKind, FrozenScalar, JointDist, LogDensityFn,
        MixtureModel, ParamTransform, Params, PowerMixture, ScalarFamily, Submodel, SubmodelEntry,
        TransDist,
    };
    pub use crate::structure::{
        realisation_range, single_realisation, zip_map, DataTree, ShapeTree, StructureError,
        StructureResult,
    };
}
