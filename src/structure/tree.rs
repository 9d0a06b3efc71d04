//! Nested realisation-data trees and structural recursion over them.
//!
//! Purpose
//! -------
//! Provide [`DataTree`], an explicit tagged tree of numeric arrays whose
//! nesting mirrors how composite models are composed, together with the
//! generic recursion used to apply functions across one or more trees of
//! matching shape. This is the foundation the slicing layer builds on: data
//! can be cut apart and reassembled without knowing the composition shape in
//! advance.
//!
//! Key behaviors
//! -------------
//! - [`DataTree::map`] / [`DataTree::try_map`] apply a (fallible) function to
//!   every leaf, preserving the tree shape.
//! - [`zip_map`] descends any number of trees in lock-step: at every node
//!   either all inputs are branches (recurse position-wise, arities must
//!   agree) or all are leaves (apply the function); anything else is a
//!   structure mismatch.
//! - [`DataTree::shapes`] reports the per-leaf array shapes in the same tree
//!   shape, for diagnostics.
//!
//! Invariants & assumptions
//! ------------------------
//! - Traversal is pure: no leaf contents are inspected beyond being handed
//!   to the supplied function, and input trees are never mutated.
//! - Branch children are matched by position; sibling order is significant.
//!
//! Conventions
//! -----------
//! - The trailing axis of each leaf indexes variate components and/or the
//!   realisation index; leading axes form the sample shape. This module does
//!   not enforce that convention — it belongs to the slicing layer.
use ndarray::ArrayD;

use crate::structure::errors::{StructureError, StructureResult};

/// A nested tree of `f64` arrays.
///
/// The outer nesting mirrors the composition tree of the model that produced
/// the data; leaves hold the actual realisation arrays. Trees are plain
/// values: cloned, compared, and rebuilt rather than mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum DataTree {
    /// A terminal array of realisation data.
    Leaf(ArrayD<f64>),
    /// An ordered sequence of subtrees.
    Branch(Vec<DataTree>),
}

/// Per-leaf shape report for a [`DataTree`], in the same tree shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeTree {
    /// Shape of the corresponding leaf array.
    Leaf(Vec<usize>),
    /// Shapes of the corresponding subtrees.
    Branch(Vec<ShapeTree>),
}

impl DataTree {
    /// Apply `f` to every leaf, returning a tree of the same shape.
    pub fn map<F>(&self, f: &F) -> DataTree
    where
        F: Fn(&ArrayD<f64>) -> ArrayD<f64>,
    {
        match self {
            DataTree::Leaf(a) => DataTree::Leaf(f(a)),
            DataTree::Branch(items) => DataTree::Branch(items.iter().map(|t| t.map(f)).collect()),
        }
    }

    /// Apply a fallible `f` to every leaf, returning a tree of the same
    /// shape or the first error encountered.
    ///
    /// # Errors
    /// Propagates whatever [`StructureError`] the leaf function reports.
    pub fn try_map<F>(&self, f: &F) -> StructureResult<DataTree>
    where
        F: Fn(&ArrayD<f64>) -> StructureResult<ArrayD<f64>>,
    {
        match self {
            DataTree::Leaf(a) => Ok(DataTree::Leaf(f(a)?)),
            DataTree::Branch(items) => {
                let mapped =
                    items.iter().map(|t| t.try_map(f)).collect::<StructureResult<Vec<_>>>()?;
                Ok(DataTree::Branch(mapped))
            }
        }
    }

    /// Report the shape of every leaf array, preserving the tree shape.
    ///
    /// Diagnostic helper; not used on any evaluation path.
    pub fn shapes(&self) -> ShapeTree {
        match self {
            DataTree::Leaf(a) => ShapeTree::Leaf(a.shape().to_vec()),
            DataTree::Branch(items) => {
                ShapeTree::Branch(items.iter().map(DataTree::shapes).collect())
            }
        }
    }
}

/// Apply an n-ary function across matching leaves of `trees`, descending all
/// inputs in lock-step.
///
/// At every node, either all inputs must be branches with equal arity
/// (recursion continues position-wise) or all must be leaves (the function
/// is applied to the corresponding leaf arrays). The result has the shared
/// tree shape of the inputs.
///
/// # Errors
/// - [`StructureError::NoInputs`] if `trees` is empty.
/// - [`StructureError::StructureMismatch`] if, at some node, some inputs are
///   branches and others are leaves.
/// - [`StructureError::ArityMismatch`] if sibling branches disagree on the
///   number of children.
/// - Any error reported by `f` at a leaf.
pub fn zip_map<F>(trees: &[&DataTree], f: &F) -> StructureResult<DataTree>
where
    F: Fn(&[&ArrayD<f64>]) -> StructureResult<ArrayD<f64>>,
{
    zip_map_at(trees, f, 0)
}

fn zip_map_at<F>(trees: &[&DataTree], f: &F, depth: usize) -> StructureResult<DataTree>
where
    F: Fn(&[&ArrayD<f64>]) -> StructureResult<ArrayD<f64>>,
{
    let mut leaves: Vec<&ArrayD<f64>> = Vec::with_capacity(trees.len());
    let mut arms: Vec<&Vec<DataTree>> = Vec::new();
    for tree in trees {
        match tree {
            DataTree::Leaf(a) => leaves.push(a),
            DataTree::Branch(items) => arms.push(items),
        }
    }
    match (leaves.is_empty(), arms.is_empty()) {
        (true, true) => Err(StructureError::NoInputs),
        (false, false) => Err(StructureError::StructureMismatch { depth }),
        (false, true) => Ok(DataTree::Leaf(f(&leaves)?)),
        (true, false) => {
            let arity = arms[0].len();
            for items in &arms {
                if items.len() != arity {
                    return Err(StructureError::ArityMismatch {
                        depth,
                        expected: arity,
                        actual: items.len(),
                    });
                }
            }
            let children = (0..arity)
                .map(|i| {
                    let at_i: Vec<&DataTree> = arms.iter().map(|items| &items[i]).collect();
                    zip_map_at(&at_i, f, depth + 1)
                })
                .collect::<StructureResult<Vec<_>>>()?;
            Ok(DataTree::Branch(children))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Identity mapping preserving arbitrary tree shapes.
    // - Lock-step zipping of multiple trees, including the mismatch and
    //   arity failure modes.
    // - Shape reporting.
    //
    // These tests intentionally DO NOT cover:
    // - Realisation slicing semantics (covered in `structure::slice`).
    // -------------------------------------------------------------------------

    fn make_nested_tree() -> DataTree {
        DataTree::Branch(vec![
            DataTree::Leaf(array![[1.0, 2.0], [3.0, 4.0]].into_dyn()),
            DataTree::Branch(vec![
                DataTree::Leaf(array![5.0, 6.0].into_dyn()),
                DataTree::Leaf(array![[7.0], [8.0]].into_dyn()),
            ]),
        ])
    }

    #[test]
    // Purpose
    // -------
    // Verify that mapping the identity function over a nested tree returns
    // an equal tree.
    //
    // Given
    // -----
    // - A two-level tree mixing 1-D and 2-D leaves.
    //
    // Expect
    // ------
    // - `map(identity)` compares equal to the original tree.
    fn map_identity_preserves_structure() {
        let tree = make_nested_tree();

        let mapped = tree.map(&|a| a.clone());

        assert_eq!(mapped, tree);
    }

    #[test]
    // Purpose
    // -------
    // Verify that `zip_map` applies a binary function to corresponding
    // leaves of two trees with identical shapes.
    //
    // Given
    // -----
    // - Two copies of the same nested tree.
    // - A leaf function summing its inputs element-wise.
    //
    // Expect
    // ------
    // - The result equals the original tree with every leaf doubled.
    fn zip_map_applies_binary_function_leafwise() {
        let tree = make_nested_tree();
        let doubled = tree.map(&|a| a * 2.0);

        let summed = zip_map(&[&tree, &tree], &|leaves| Ok(leaves[0] + leaves[1]))
            .expect("matching trees should zip successfully");

        assert_eq!(summed, doubled);
    }

    #[test]
    // Purpose
    // -------
    // Ensure `zip_map` rejects trees whose node kinds disagree at some
    // depth.
    //
    // Given
    // -----
    // - One tree with a branch at the second position, one with a leaf.
    //
    // Expect
    // ------
    // - `zip_map` returns `StructureError::StructureMismatch { depth: 1 }`.
    fn zip_map_mixed_node_kinds_yields_structure_mismatch() {
        let a = make_nested_tree();
        let b = DataTree::Branch(vec![
            DataTree::Leaf(array![[1.0, 2.0], [3.0, 4.0]].into_dyn()),
            DataTree::Leaf(array![5.0, 6.0].into_dyn()),
        ]);

        let err = zip_map(&[&a, &b], &|leaves| Ok(leaves[0].clone()))
            .expect_err("mixed node kinds must not zip");

        assert_eq!(err, StructureError::StructureMismatch { depth: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure `zip_map` rejects sibling branches with different arities.
    //
    // Given
    // -----
    // - Two root branches holding two and three children respectively.
    //
    // Expect
    // ------
    // - `zip_map` returns `StructureError::ArityMismatch` at depth 0.
    fn zip_map_arity_disagreement_yields_arity_mismatch() {
        let leaf = || DataTree::Leaf(array![1.0].into_dyn());
        let a = DataTree::Branch(vec![leaf(), leaf()]);
        let b = DataTree::Branch(vec![leaf(), leaf(), leaf()]);

        let err = zip_map(&[&a, &b], &|leaves| Ok(leaves[0].clone()))
            .expect_err("differing arities must not zip");

        assert_eq!(err, StructureError::ArityMismatch { depth: 0, expected: 2, actual: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure `zip_map` over zero inputs is reported as an error rather than
    // silently producing an empty result.
    //
    // Given
    // -----
    // - An empty input slice.
    //
    // Expect
    // ------
    // - `zip_map` returns `StructureError::NoInputs`.
    fn zip_map_without_inputs_yields_no_inputs_error() {
        let err = zip_map(&[], &|leaves: &[&ArrayD<f64>]| Ok(leaves[0].clone()))
            .expect_err("zipping nothing must fail");

        assert_eq!(err, StructureError::NoInputs);
    }

    #[test]
    // Purpose
    // -------
    // Verify that `shapes` reports per-leaf shapes in the same tree shape.
    //
    // Given
    // -----
    // - The standard nested tree with leaves of shape [2, 2], [2], [2, 1].
    //
    // Expect
    // ------
    // - A `ShapeTree` mirroring the nesting with those shapes.
    fn shapes_reports_leaf_shapes_in_tree_order() {
        let tree = make_nested_tree();

        let report = tree.shapes();

        let expected = ShapeTree::Branch(vec![
            ShapeTree::Leaf(vec![2, 2]),
            ShapeTree::Branch(vec![ShapeTree::Leaf(vec![2]), ShapeTree::Leaf(vec![2, 1])]),
        ]);
        assert_eq!(report, expected);
    }
}
