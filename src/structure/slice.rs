//! Realisation slicing over nested data trees.
//!
//! Purpose
//! -------
//! Extract a single data realisation, or a contiguous range of realisations,
//! from a [`DataTree`] whose leaves may be buried arbitrarily deep. Each leaf
//! is flattened to two dimensions (all leading axes collapsed, trailing axis
//! kept), the requested rows are taken, and the results are reassembled in
//! the same tree shape. A summary shape travels alongside the tree so
//! callers can track how many realisations a block holds without walking it.
//!
//! Key behaviors
//! -------------
//! - [`flatten_rows`] collapses a leaf to `(rows, width)` with the trailing
//!   axis preserved; a 1-D leaf is a single row.
//! - [`single_realisation`] picks row `i` from every leaf (1-D results) and
//!   reports the updated summary shape `(1, width)`.
//! - [`realisation_range`] picks rows `[i, j)` from every leaf (2-D results)
//!   and reports `(j - i, width)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The trailing axis of every leaf indexes variate components; leading
//!   axes index realisations.
//! - Selection indices are validated against each leaf's flattened row
//!   count; out-of-range requests are reported, never clamped.
//! - Input trees are never mutated; sliced copies are returned.
//!
//! Conventions
//! -----------
//! - Ranges are half-open `[i, j)`, 0-based.
//! - The summary shape's last element is the trailing-axis size; the rest of
//!   the summary shape is not interpreted here.
use ndarray::{s, Array2, ArrayD};

use crate::structure::errors::{StructureError, StructureResult};
use crate::structure::tree::DataTree;

/// Flatten a leaf array to two dimensions, keeping the trailing axis.
///
/// A leaf of shape `(a, b, ..., w)` becomes `(a * b * ..., w)`; a 1-D leaf of
/// shape `(w,)` becomes `(1, w)`.
///
/// # Errors
/// - [`StructureError::NoVariateAxis`] if the leaf has no axes.
pub fn flatten_rows(a: &ArrayD<f64>) -> StructureResult<Array2<f64>> {
    if a.ndim() == 0 {
        return Err(StructureError::NoVariateAxis);
    }
    let width = a.shape()[a.ndim() - 1];
    let rows = if width == 0 { 0 } else { a.len() / width };
    let values: Vec<f64> = a.iter().copied().collect();
    Ok(Array2::from_shape_vec((rows, width), values)?)
}

/// Extract realisation `i` from every leaf of `data`.
///
/// Each leaf is flattened via [`flatten_rows`] and row `i` is taken as a 1-D
/// array. Returns the sliced tree together with the updated summary shape
/// `(1, width)`, where `width` is the last element of the incoming summary
/// `shape`.
///
/// # Errors
/// - [`StructureError::EmptySummaryShape`] if `shape` is empty.
/// - [`StructureError::RowOutOfRange`] if `i` exceeds some leaf's rows.
/// - [`StructureError::NoVariateAxis`] for a 0-D leaf.
pub fn single_realisation(
    data: &DataTree, shape: &[usize], i: usize,
) -> StructureResult<(DataTree, (usize, usize))> {
    let width = trailing_size(shape)?;
    let sliced = data.try_map(&|a: &ArrayD<f64>| {
        let flat = flatten_rows(a)?;
        if i >= flat.nrows() {
            return Err(StructureError::RowOutOfRange { index: i, rows: flat.nrows() });
        }
        Ok(flat.row(i).to_owned().into_dyn())
    })?;
    Ok((sliced, (1, width)))
}

/// Extract realisations `[i, j)` from every leaf of `data`.
///
/// Each leaf is flattened via [`flatten_rows`] and rows `i..j` are taken as
/// a 2-D array. Returns the sliced tree together with the updated summary
/// shape `(j - i, width)`.
///
/// # Errors
/// - [`StructureError::EmptySummaryShape`] if `shape` is empty.
/// - [`StructureError::InvalidRange`] if `i > j` or `j` exceeds some leaf's
///   rows.
/// - [`StructureError::NoVariateAxis`] for a 0-D leaf.
pub fn realisation_range(
    data: &DataTree, shape: &[usize], i: usize, j: usize,
) -> StructureResult<(DataTree, (usize, usize))> {
    let width = trailing_size(shape)?;
    let sliced = data.try_map(&|a: &ArrayD<f64>| {
        let flat = flatten_rows(a)?;
        if i > j || j > flat.nrows() {
            return Err(StructureError::InvalidRange { start: i, end: j, rows: flat.nrows() });
        }
        Ok(flat.slice(s![i..j, ..]).to_owned().into_dyn())
    })?;
    Ok((sliced, (j - i, width)))
}

fn trailing_size(shape: &[usize]) -> StructureResult<usize> {
    shape.last().copied().ok_or(StructureError::EmptySummaryShape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Flattening of multi-axis leaves and the 1-D single-row convention.
    // - Single-index and range slicing over nested trees, including summary
    //   shape updates and agreement between the two selection forms.
    // - Out-of-range and empty-summary failure modes.
    // -------------------------------------------------------------------------

    fn make_block() -> DataTree {
        // Three realisations of a two-component model: one bivariate leaf
        // and one nested univariate leaf.
        DataTree::Branch(vec![
            DataTree::Leaf(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]].into_dyn()),
            DataTree::Branch(vec![DataTree::Leaf(array![[10.0], [20.0], [30.0]].into_dyn())]),
        ])
    }

    #[test]
    // Purpose
    // -------
    // Verify `flatten_rows` collapses leading axes and keeps the trailing
    // axis, and that a 1-D leaf becomes a single row.
    //
    // Given
    // -----
    // - A (2, 2, 3) array and a (3,) array.
    //
    // Expect
    // ------
    // - Shapes (4, 3) and (1, 3) respectively, values in logical order.
    fn flatten_rows_collapses_leading_axes() {
        let cube = ArrayD::from_shape_vec(vec![2, 2, 3], (0..12).map(f64::from).collect())
            .expect("shape matches element count");
        let line = array![1.0, 2.0, 3.0].into_dyn();

        let flat_cube = flatten_rows(&cube).expect("3-D leaf flattens");
        let flat_line = flatten_rows(&line).expect("1-D leaf flattens");

        assert_eq!(flat_cube.shape(), &[4, 3]);
        assert_eq!(flat_cube.row(3).to_vec(), vec![9.0, 10.0, 11.0]);
        assert_eq!(flat_line.shape(), &[1, 3]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that single-index selection matches taking the sole row of the
    // corresponding unit range.
    //
    // Given
    // -----
    // - The standard three-realisation block and index 1.
    //
    // Expect
    // ------
    // - `single_realisation(.., 1)` leaf values equal the single row of
    //   `realisation_range(.., 1, 2)` leaves.
    // - Summary shapes are (1, width) in both cases.
    fn single_index_agrees_with_unit_range() {
        let block = make_block();
        let shape = [3, 2];

        let (single, single_shape) =
            single_realisation(&block, &shape, 1).expect("index 1 is in range");
        let (range, range_shape) =
            realisation_range(&block, &shape, 1, 2).expect("range [1, 2) is in range");

        assert_eq!(single_shape, (1, 2));
        assert_eq!(range_shape, (1, 2));
        let flattened_range = range.map(&|a| {
            flatten_rows(a).expect("sliced leaves flatten").row(0).to_owned().into_dyn()
        });
        assert_eq!(single, flattened_range);
    }

    #[test]
    // Purpose
    // -------
    // Verify range selection slices every leaf and reports the updated
    // summary shape.
    //
    // Given
    // -----
    // - The standard block and range [0, 2).
    //
    // Expect
    // ------
    // - Each leaf keeps its first two rows; summary shape is (2, 2).
    fn range_selection_slices_all_leaves() {
        let block = make_block();

        let (sliced, shape) =
            realisation_range(&block, &[3, 2], 0, 2).expect("range [0, 2) is in range");

        assert_eq!(shape, (2, 2));
        let expected = DataTree::Branch(vec![
            DataTree::Leaf(array![[1.0, 2.0], [3.0, 4.0]].into_dyn()),
            DataTree::Branch(vec![DataTree::Leaf(array![[10.0], [20.0]].into_dyn())]),
        ]);
        assert_eq!(sliced, expected);
    }

    #[test]
    // Purpose
    // -------
    // Ensure out-of-range selections are reported with leaf row counts.
    //
    // Given
    // -----
    // - The standard block (3 rows per leaf), index 3 and range [2, 5).
    //
    // Expect
    // ------
    // - `RowOutOfRange { index: 3, rows: 3 }` and
    //   `InvalidRange { start: 2, end: 5, rows: 3 }`.
    fn out_of_range_selection_is_reported() {
        let block = make_block();

        let single_err =
            single_realisation(&block, &[3, 2], 3).expect_err("index 3 exceeds 3 rows");
        let range_err =
            realisation_range(&block, &[3, 2], 2, 5).expect_err("range end exceeds 3 rows");

        assert_eq!(single_err, StructureError::RowOutOfRange { index: 3, rows: 3 });
        assert_eq!(range_err, StructureError::InvalidRange { start: 2, end: 5, rows: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure an empty summary shape is rejected before any leaf is touched.
    //
    // Given
    // -----
    // - The standard block and an empty summary shape.
    //
    // Expect
    // ------
    // - `StructureError::EmptySummaryShape`.
    fn empty_summary_shape_is_rejected() {
        let block = make_block();

        let err = single_realisation(&block, &[], 0).expect_err("empty summary must fail");

        assert_eq!(err, StructureError::EmptySummaryShape);
    }
}
