//! structure — nested realisation-data trees: recursion, slicing, and errors.
//!
//! Purpose
//! -------
//! House the structural layer underneath the composite distributions: an
//! explicit tree of numeric arrays ([`DataTree`]) whose nesting mirrors model
//! composition, the generic lock-step recursion over such trees
//! ([`zip_map`]), and realisation slicing that cuts single realisations or
//! ranges out of a block without knowing its shape in advance.
//!
//! Key behaviors
//! -------------
//! - [`tree`] defines [`DataTree`]/[`ShapeTree`] with `map`/`try_map`,
//!   n-ary [`zip_map`], and shape reporting.
//! - [`slice`] flattens leaves to `(rows, width)` and extracts realisation
//!   rows, returning sliced trees plus `(count, width)` summary shapes.
//! - [`errors`] centralizes [`StructureError`] and the [`StructureResult`]
//!   alias for the whole layer.
//!
//! Downstream usage
//! ----------------
//! - The composite layer splits and reassembles multi-component realisation
//!   data through these primitives; analysis code iterating over single
//!   realisations uses [`single_realisation`] / [`realisation_range`]
//!   directly.
//! - Everything here is shape-generic: no distribution semantics leak in.
pub mod errors;
pub mod slice;
pub mod tree;

pub use errors::{StructureError, StructureResult};
pub use slice::{flatten_rows, realisation_range, single_realisation};
pub use tree::{zip_map, DataTree, ShapeTree};
