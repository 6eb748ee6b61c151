//! Input validation for matrix sources, vectors and solver parameters.
//!
//! All checks run eagerly, before a single sweep is attempted, so callers
//! get a precise [`ValidationError`] instead of a confusing numerical outcome.
//!
//! # Limits
//!
//! | Resource      | Limit         | Constant           |
//! |---------------|---------------|--------------------|
//! | Rows/columns  | 10,000,000    | [`MAX_NODES`]      |
//! | Stored values | 100,000,000   | [`MAX_EDGES`]      |
//! | Iterations    | 1,000,000     | [`MAX_ITERATIONS`] |

use crate::error::ValidationError;

/// Maximum number of rows or columns.
pub const MAX_NODES: usize = 10_000_000;

/// Maximum number of stored entries.
pub const MAX_EDGES: usize = 100_000_000;

/// Maximum sweep budget a solver will accept.
pub const MAX_ITERATIONS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Reject NaN and infinities.
///
/// `what` names the sequence in the error message (e.g. `"rhs"`).
pub fn validate_finite(values: &[f64], what: &str) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ValidationError::NonFiniteValue(format!(
            "{what}[{i}] = {}",
            values[i]
        ))),
        None => Ok(()),
    }
}

fn validate_shape(rows: usize, cols: usize) -> Result<(), ValidationError> {
    if rows > MAX_NODES || cols > MAX_NODES {
        return Err(ValidationError::DimensionMismatch(format!(
            "matrix size {rows}x{cols} exceeds maximum supported {MAX_NODES}x{MAX_NODES}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dense grids
// ---------------------------------------------------------------------------

/// Validate a dense row-major grid and return its `(rows, cols)` shape.
///
/// Every row must have the length of row 0 and every cell must be finite.
/// An empty grid has shape `(0, 0)`.
pub fn validate_dense_grid(grid: &[Vec<f64>]) -> Result<(usize, usize), ValidationError> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    validate_shape(rows, cols)?;

    for (i, row) in grid.iter().enumerate() {
        if row.len() != cols {
            return Err(ValidationError::RaggedRows {
                row: i,
                expected: cols,
                found: row.len(),
            });
        }
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue(format!(
                "dense[{i}][{j}] = {}",
                row[j]
            )));
        }
    }

    Ok((rows, cols))
}

// ---------------------------------------------------------------------------
// Triplets
// ---------------------------------------------------------------------------

/// Validate a `(row, col, value)` triplet list against a declared shape.
///
/// Checks, in order:
///
/// 1. The shape is within [`MAX_NODES`] and the count within [`MAX_EDGES`].
/// 2. `entries.len() <= rows * cols`.
/// 3. Every `(row, col)` lies inside the shape.
/// 4. Every value is finite.
///
/// Cell collisions are detected separately by [`validate_unique_cells`] once
/// the list has been sorted.
pub fn validate_triplets(
    rows: usize,
    cols: usize,
    entries: &[(usize, usize, f64)],
) -> Result<(), ValidationError> {
    validate_shape(rows, cols)?;
    if entries.len() > MAX_EDGES {
        return Err(ValidationError::DimensionMismatch(format!(
            "nnz {} exceeds maximum allowed {MAX_EDGES}",
            entries.len()
        )));
    }

    let capacity = rows.saturating_mul(cols);
    if entries.len() > capacity {
        return Err(ValidationError::TooManyEntries {
            count: entries.len(),
            capacity,
        });
    }

    for &(row, col, value) in entries {
        if row >= rows || col >= cols {
            return Err(ValidationError::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!(
                "entry ({row}, {col}) = {value}"
            )));
        }
    }

    Ok(())
}

/// Reject a triplet list, already sorted by `(row, col)`, in which two
/// entries address the same cell.
pub fn validate_unique_cells(sorted: &[(usize, usize, f64)]) -> Result<(), ValidationError> {
    for pair in sorted.windows(2) {
        let (r0, c0, _) = pair[0];
        let (r1, c1, _) = pair[1];
        if r0 == r1 && c0 == c1 {
            return Err(ValidationError::DuplicateEntry { row: r0, col: c0 });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Raw CSR arrays
// ---------------------------------------------------------------------------

/// Validate the structural integrity of raw CSR arrays.
///
/// 1. `row_start.len() == rows + 1`, `row_start[0] == 0`,
///    `row_start[rows] == nnz`.
/// 2. `row_start` is non-decreasing.
/// 3. `col_index.len() == values.len()`.
/// 4. Every column index is `< cols` and no column repeats within a row.
/// 5. Every value is finite.
///
/// Unsorted columns within a row are legal; they only emit a
/// [`tracing::warn`].
pub fn validate_csr(
    rows: usize,
    cols: usize,
    row_start: &[usize],
    col_index: &[usize],
    values: &[f64],
) -> Result<(), ValidationError> {
    validate_shape(rows, cols)?;

    if row_start.len() != rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_start length {} does not equal rows + 1 = {}",
            row_start.len(),
            rows + 1,
        )));
    }
    if col_index.len() != values.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "col_index length {} does not match values length {}",
            col_index.len(),
            values.len(),
        )));
    }
    if row_start[0] != 0 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_start[0] = {} (expected 0)",
            row_start[0],
        )));
    }
    for i in 1..row_start.len() {
        if row_start[i] < row_start[i - 1] {
            return Err(ValidationError::NonMonotonicRowStart { position: i });
        }
    }
    if row_start[rows] != values.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "values length {} does not match row_start[rows] = {}",
            values.len(),
            row_start[rows],
        )));
    }

    for row in 0..rows {
        let range = row_start[row]..row_start[row + 1];
        let mut sorted = true;
        for idx in range.clone() {
            let col = col_index[idx];
            if col >= cols {
                return Err(ValidationError::IndexOutOfBounds {
                    row,
                    col,
                    rows,
                    cols,
                });
            }
            if !values[idx].is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "matrix[{row}, {col}] = {}",
                    values[idx]
                )));
            }
            if idx > range.start && col <= col_index[idx - 1] {
                sorted = false;
            }
        }
        if !sorted {
            let mut seen: Vec<usize> = col_index[range].to_vec();
            seen.sort_unstable();
            if let Some(pair) = seen.windows(2).find(|p| p[0] == p[1]) {
                return Err(ValidationError::DuplicateEntry { row, col: pair[0] });
            }
            tracing::warn!(row, "column indices not sorted within row");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Solver parameters
// ---------------------------------------------------------------------------

/// Validate SOR parameters.
///
/// - `max_iterations` must be in `[1, MAX_ITERATIONS]`.
/// - `tolerance` must be finite and strictly positive.
/// - `relaxation_factor` must be finite. Values outside `(0, 2)` are legal
///   but logged, since SOR cannot converge there in general.
/// - `divergence_streak` must be at least 1.
pub fn validate_params(
    max_iterations: usize,
    tolerance: f64,
    relaxation_factor: f64,
    divergence_streak: usize,
) -> Result<(), ValidationError> {
    if max_iterations == 0 || max_iterations > MAX_ITERATIONS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "max_iterations".into(),
            value: max_iterations.to_string(),
            expected: format!("[1, {MAX_ITERATIONS}]"),
        });
    }

    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "tolerance".into(),
            value: format!("{tolerance:.2e}"),
            expected: "finite positive value".into(),
        });
    }

    if !relaxation_factor.is_finite() {
        return Err(ValidationError::ParameterOutOfRange {
            name: "relaxation_factor".into(),
            value: relaxation_factor.to_string(),
            expected: "finite value".into(),
        });
    }
    if relaxation_factor <= 0.0 || relaxation_factor >= 2.0 {
        tracing::warn!(
            relaxation_factor,
            "relaxation factor outside (0, 2); SOR is not expected to converge"
        );
    }

    if divergence_streak == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "divergence_streak".into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }

    Ok(())
}
