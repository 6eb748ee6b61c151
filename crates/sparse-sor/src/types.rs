//! Core types for the SOR solver.
//!
//! Provides [`SparseMatrix`] for compressed sparse row storage, the
//! [`MatrixSource`] it is built from, and the result types a solve reports.

use serde::{Deserialize, Serialize};

use crate::error::{SorError, ValidationError};
use crate::validation::{
    validate_csr, validate_dense_grid, validate_triplets, validate_unique_cells,
};

// ---------------------------------------------------------------------------
// MatrixSource
// ---------------------------------------------------------------------------

/// The two input shapes a [`SparseMatrix`] can be assembled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatrixSource {
    /// Dense row-major grid. Zero cells are dropped.
    Dense { grid: Vec<Vec<f64>> },
    /// Declared shape plus `(row, col, value)` entries.
    Triplets {
        rows: usize,
        cols: usize,
        entries: Vec<(usize, usize, f64)>,
    },
}

// ---------------------------------------------------------------------------
// SparseMatrix
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix of `f64`.
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` stored entries:
/// - `row_start` has length `m + 1`, starts at 0, ends at `nnz` and never
///   decreases
/// - `col_index` and `values` each have length `nnz`
/// - Row `i` spans indices `row_start[i]..row_start[i+1]`; an empty row has
///   an empty span
///
/// No cell is stored twice. The matrix is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    row_start: Vec<usize>,
    col_index: Vec<usize>,
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl SparseMatrix {
    /// Build from either input shape.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for ragged or non-finite dense input,
    /// out-of-range triplets, too many triplets, or two triplets sharing a
    /// cell.
    pub fn from_source(source: MatrixSource) -> Result<Self, ValidationError> {
        match source {
            MatrixSource::Dense { grid } => Self::from_dense(&grid),
            MatrixSource::Triplets {
                rows,
                cols,
                entries,
            } => Self::from_triplets(rows, cols, entries),
        }
    }

    /// Build from a dense row-major grid, dropping zero cells.
    pub fn from_dense(grid: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let (rows, cols) = validate_dense_grid(grid)?;
        // Row-major traversal is already in (row, col) order.
        let entries: Vec<(usize, usize, f64)> = grid
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &v)| v != 0.0)
                    .map(move |(j, &v)| (i, j, v))
            })
            .collect();
        Ok(Self::from_sorted_triplets(rows, cols, entries))
    }

    /// Build from COO triplets on a declared `rows x cols` shape.
    ///
    /// Entries are sorted by `(row, col)`. A repeated cell is an error and is
    /// never summed or overwritten, even when one of the writes is zero. Zero
    /// values are then dropped, so both sources store only nonzeros.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self, ValidationError> {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        validate_triplets(rows, cols, &sorted)?;
        sorted.sort_unstable_by_key(|&(r, c, _)| (r, c));
        validate_unique_cells(&sorted)?;
        sorted.retain(|&(_, _, v)| v != 0.0);
        Ok(Self::from_sorted_triplets(rows, cols, sorted))
    }

    /// Adopt already-built CSR arrays after structural validation.
    pub fn from_raw_parts(
        rows: usize,
        cols: usize,
        row_start: Vec<usize>,
        col_index: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        validate_csr(rows, cols, &row_start, &col_index, &values)?;
        Ok(Self {
            row_start,
            col_index,
            values,
            rows,
            cols,
        })
    }

    /// Square identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        Self {
            row_start: (0..=n).collect(),
            col_index: (0..n).collect(),
            values: vec![1.0; n],
            rows: n,
            cols: n,
        }
    }

    /// Single pass over validated, sorted, collision-free triplets.
    fn from_sorted_triplets(rows: usize, cols: usize, sorted: Vec<(usize, usize, f64)>) -> Self {
        let nnz = sorted.len();
        let mut row_start = Vec::with_capacity(rows + 1);
        let mut col_index = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        // `next_row` is the first row whose start has not been emitted yet.
        // Skipped rows repeat the current offset, giving them an empty span.
        let mut next_row = 0;
        for (r, c, v) in sorted {
            while next_row <= r {
                row_start.push(col_index.len());
                next_row += 1;
            }
            col_index.push(c);
            values.push(v);
        }
        while next_row <= rows {
            row_start.push(col_index.len());
            next_row += 1;
        }

        Self {
            row_start,
            col_index,
            values,
            rows,
            cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn row_start(&self) -> &[usize] {
        &self.row_start
    }

    #[inline]
    pub fn col_index(&self) -> &[usize] {
        &self.col_index
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(col, value)` pairs stored in `row`.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.row_start[row]..self.row_start[row + 1];
        self.col_index[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Stored diagonal entry of `row`, or `0.0` when none is stored.
    pub fn diagonal(&self, row: usize) -> f64 {
        self.row_entries(row)
            .find(|&(c, _)| c == row)
            .map_or(0.0, |(_, v)| v)
    }

    /// Reconstruct the dense `rows x cols` grid, zero-filling absent cells.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.cols]; self.rows];
        for (i, row) in dense.iter_mut().enumerate() {
            for (c, v) in self.row_entries(i) {
                row[c] = v;
            }
        }
        dense
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// `true` when the matrix is square and every row satisfies
    /// `|a_ii| > sum_{j != i} |a_ij|`.
    pub fn is_strictly_row_diagonally_dominant(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        (0..self.rows).all(|i| {
            let mut diag = 0.0f64;
            let mut off = 0.0f64;
            for (c, v) in self.row_entries(i) {
                if c == i {
                    diag = v.abs();
                } else {
                    off += v.abs();
                }
            }
            diag > off
        })
    }

    /// `columns == v.len()`.
    #[inline]
    pub fn is_conformable<V: AsRef<[f64]> + ?Sized>(&self, v: &V) -> bool {
        self.cols == v.as_ref().len()
    }

    /// Sparse matrix-vector product `A * v`.
    ///
    /// # Errors
    ///
    /// [`SorError::NonConformable`] if `v.len() != cols`.
    pub fn multiply_by_vector<V: AsRef<[f64]> + ?Sized>(&self, v: &V) -> Result<Vec<f64>, SorError> {
        let v = v.as_ref();
        if !self.is_conformable(v) {
            return Err(SorError::NonConformable {
                expected: self.cols,
                found: v.len(),
            });
        }
        let mut y = vec![0.0; self.rows];
        self.spmv(v, &mut y);
        Ok(y)
    }

    /// Sparse matrix-vector multiply into a caller buffer: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= self.cols` and `y.len() >= self.rows`.
    #[inline]
    pub fn spmv(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(
            x.len() >= self.cols,
            "spmv: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "spmv: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for (i, yi) in y.iter_mut().take(self.rows).enumerate() {
            let mut sum = 0.0;
            for idx in self.row_start[i]..self.row_start[i + 1] {
                sum += self.values[idx] * x[self.col_index[idx]];
            }
            *yi = sum;
        }
    }

    /// L1 residual `sum_i |b_i - (A x)_i|`, fused with the product so no
    /// intermediate vector is allocated.
    pub fn residual_l1(&self, x: &[f64], b: &[f64]) -> f64 {
        debug_assert!(x.len() >= self.cols);
        debug_assert!(b.len() >= self.rows);

        (0..self.rows)
            .map(|i| {
                let ax_i: f64 = self.row_entries(i).map(|(c, v)| v * x[c]).sum();
                (b[i] - ax_i).abs()
            })
            .sum()
    }

    /// Maximum absolute column sum.
    pub fn one_norm(&self) -> f64 {
        let mut col_sums = vec![0.0f64; self.cols];
        for (&c, &v) in self.col_index.iter().zip(&self.values) {
            col_sums[c] += v.abs();
        }
        col_sums.into_iter().fold(0.0, f64::max)
    }

    /// Maximum absolute row sum.
    pub fn infinity_norm(&self) -> f64 {
        (0..self.rows)
            .map(|i| self.row_entries(i).map(|(_, v)| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Solver result types
// ---------------------------------------------------------------------------

/// Why a solve stopped.
///
/// [`Unknown`](Self::Unknown) is the only non-terminal state; every other
/// variant is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoppingReason {
    /// Still iterating.
    #[default]
    Unknown,
    /// The sweep budget ran out.
    MaxIterationsReached,
    /// Consecutive iterates stopped moving.
    XSequenceConvergence,
    /// `b - A x` became negligible.
    ResidualConvergence,
    /// The iterate delta grew for too many consecutive sweeps.
    XSequenceDivergence,
    /// A row had no usable pivot.
    ZeroOnDiagonal,
    /// The wall-clock deadline passed between sweeps.
    DeadlineExceeded,
    /// The caller's cancel token fired between sweeps.
    Cancelled,
}

impl StoppingReason {
    /// `true` for either convergence criterion.
    #[inline]
    pub fn is_converged(self) -> bool {
        matches!(self, Self::XSequenceConvergence | Self::ResidualConvergence)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Self::Unknown
    }
}

impl std::fmt::Display for StoppingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoppingReason::Unknown => "UNKNOWN",
            StoppingReason::MaxIterationsReached => "MAX_ITERATIONS_REACHED",
            StoppingReason::XSequenceConvergence => "X_SEQUENCE_CONVERGENCE",
            StoppingReason::ResidualConvergence => "RESIDUAL_CONVERGENCE",
            StoppingReason::XSequenceDivergence => "X_SEQUENCE_DIVERGENCE",
            StoppingReason::ZeroOnDiagonal => "ZERO_ON_DIAGONAL",
            StoppingReason::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StoppingReason::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Per-sweep convergence snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceInfo {
    /// Sweep number (1-based; the count of completed sweeps).
    pub iteration: usize,
    /// L1 distance from the previous iterate. Infinite after the first sweep.
    pub x_delta: f64,
}

/// Everything a caller needs from a finished solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SorReport {
    /// Final iterate.
    pub solution_values: Vec<f64>,
    pub stopping_reason: StoppingReason,
    /// Number of completed sweeps.
    pub iteration_count: usize,
    /// `sum_i |b_i - (A x)_i|` for the final iterate.
    pub residual_sum: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[f64]]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn dense_build_drops_zeros() {
        let m = SparseMatrix::from_dense(&grid(&[&[1.0, 0.0], &[0.0, 2.0]])).unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.row_start(), &[0, 1, 2]);
        assert_eq!(m.col_index(), &[0, 1]);
        assert_eq!(m.values(), &[1.0, 2.0]);
    }

    #[test]
    fn empty_first_middle_and_last_rows() {
        let m = SparseMatrix::from_triplets(5, 2, vec![(3, 1, 7.0), (1, 0, 4.0)]).unwrap();
        assert_eq!(m.row_start(), &[0, 0, 1, 1, 2, 2]);
        assert_eq!(m.col_index(), &[0, 1]);
        assert_eq!(m.values(), &[4.0, 7.0]);
        assert_eq!(m.row_entries(0).count(), 0);
        assert_eq!(m.row_entries(4).count(), 0);
    }

    #[test]
    fn all_rows_empty() {
        let m = SparseMatrix::from_triplets(3, 3, Vec::new()).unwrap();
        assert_eq!(m.row_start(), &[0, 0, 0, 0]);
        assert_eq!(m.to_dense(), vec![vec![0.0; 3]; 3]);
    }

    #[test]
    fn duplicate_triplet_is_an_error() {
        let err = SparseMatrix::from_triplets(2, 2, vec![(1, 1, 1.0), (0, 0, 1.0), (1, 1, 2.0)])
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateEntry { row: 1, col: 1 });
    }

    #[test]
    fn zero_triplets_are_not_stored() {
        let m = SparseMatrix::from_triplets(2, 2, vec![(0, 1, 0.0), (1, 1, 3.0), (0, 0, 2.0)])
            .unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.row_start(), &[0, 1, 2]);
        assert_eq!(m.values(), &[2.0, 3.0]);

        // A zero write still collides with another write to the same cell.
        let err = SparseMatrix::from_triplets(2, 2, vec![(0, 1, 0.0), (0, 1, 5.0)]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateEntry { row: 0, col: 1 });
    }

    #[test]
    fn from_source_dispatches() {
        let dense = SparseMatrix::from_source(MatrixSource::Dense {
            grid: grid(&[&[2.0, 1.0]]),
        })
        .unwrap();
        let trip = SparseMatrix::from_source(MatrixSource::Triplets {
            rows: 1,
            cols: 2,
            entries: vec![(0, 1, 1.0), (0, 0, 2.0)],
        })
        .unwrap();
        assert_eq!(dense, trip);
    }

    #[test]
    fn raw_parts_are_validated() {
        assert!(SparseMatrix::from_raw_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![1.0, 1.0]).is_ok());
        assert!(SparseMatrix::from_raw_parts(2, 2, vec![0, 1], vec![1], vec![1.0]).is_err());
    }

    #[test]
    fn diagonal_defaults_to_zero() {
        let m = SparseMatrix::from_dense(&grid(&[&[4.0, 1.0], &[1.0, 0.0]])).unwrap();
        assert_eq!(m.diagonal(0), 4.0);
        assert_eq!(m.diagonal(1), 0.0);
    }

    #[test]
    fn norms() {
        let m = SparseMatrix::from_dense(&grid(&[&[1.0, -2.0], &[-3.0, 4.0]])).unwrap();
        assert_eq!(m.one_norm(), 6.0);
        assert_eq!(m.infinity_norm(), 7.0);
        let empty = SparseMatrix::from_dense(&[]).unwrap();
        assert_eq!(empty.one_norm(), 0.0);
        assert_eq!(empty.infinity_norm(), 0.0);
    }

    #[test]
    fn non_square_is_never_dominant() {
        let m = SparseMatrix::from_dense(&grid(&[&[5.0, 0.0, 0.0], &[0.0, 5.0, 0.0]])).unwrap();
        assert!(!m.is_square());
        assert!(!m.is_strictly_row_diagonally_dominant());
    }

    #[test]
    fn zero_row_is_not_dominant() {
        let m = SparseMatrix::from_dense(&grid(&[&[1.0, 0.0], &[0.0, 0.0]])).unwrap();
        assert!(!m.is_strictly_row_diagonally_dominant());
    }

    #[test]
    fn multiply_rejects_wrong_length() {
        let m = SparseMatrix::identity(3);
        assert!(m.is_conformable(&[1.0, 2.0, 3.0]));
        assert!(matches!(
            m.multiply_by_vector(&[1.0, 2.0]),
            Err(SorError::NonConformable {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn residual_l1_of_exact_solution_is_zero() {
        let m = SparseMatrix::from_dense(&grid(&[&[2.0, 1.0], &[1.0, 3.0]])).unwrap();
        assert_eq!(m.residual_l1(&[1.0, 1.0], &[3.0, 4.0]), 0.0);
        assert_eq!(m.residual_l1(&[0.0, 0.0], &[3.0, -4.0]), 7.0);
    }

    #[test]
    fn stopping_reason_display_and_serde_agree() {
        let reason = StoppingReason::XSequenceDivergence;
        assert_eq!(reason.to_string(), "X_SEQUENCE_DIVERGENCE");
        assert_eq!(
            serde_json::to_string(&reason).unwrap(),
            "\"X_SEQUENCE_DIVERGENCE\""
        );
        assert!(StoppingReason::ResidualConvergence.is_converged());
        assert!(!StoppingReason::ZeroOnDiagonal.is_converged());
        assert!(!StoppingReason::Unknown.is_terminal());
        assert_eq!(StoppingReason::default(), StoppingReason::Unknown);
    }

    #[test]
    fn matrix_source_serde_shape() {
        let src: MatrixSource = serde_json::from_str(
            r#"{"kind":"triplets","rows":2,"cols":2,"entries":[[0,0,1.0],[1,1,2.0]]}"#,
        )
        .unwrap();
        let m = SparseMatrix::from_source(src).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1.0, 0.0], vec![0.0, 2.0]]);
    }
}
