//! Error types for the SOR crate.
//!
//! Only construction-time misuse is an error. Every outcome of a solve that
//! actually runs (convergence, divergence, a zero pivot, an exhausted budget)
//! is reported through [`StoppingReason`](crate::types::StoppingReason)
//! instead. All errors implement `std::error::Error` via `thiserror`.

/// Primary error type for matrix and solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SorError {
    /// Operand shapes do not line up (matrix rows vs. rhs length, or matrix
    /// columns vs. multiplicand length).
    #[error("non-conformable operands: matrix dimension {expected} vs vector length {found}")]
    NonConformable {
        /// Dimension the matrix requires.
        expected: usize,
        /// Length of the offending vector.
        found: usize,
    },

    /// The caller supplied malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

/// Validation errors for matrix sources, vectors and solver parameters.
///
/// These are raised eagerly, before any sweep runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Array lengths are inconsistent with the declared shape.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A triplet addresses a cell outside the declared shape.
    #[error("entry ({row}, {col}) out of bounds for a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        /// Row index of the offending entry.
        row: usize,
        /// Column index of the offending entry.
        col: usize,
        /// Declared row count.
        rows: usize,
        /// Declared column count.
        cols: usize,
    },

    /// Two triplets write to the same cell.
    #[error("duplicate entries written to cell ({row}, {col})")]
    DuplicateEntry {
        /// Row of the collision.
        row: usize,
        /// Column of the collision.
        col: usize,
    },

    /// More triplets than the declared shape has cells.
    #[error("{count} entries cannot fit in a matrix with {capacity} cells")]
    TooManyEntries {
        /// Number of triplets supplied.
        count: usize,
        /// `rows * cols`.
        capacity: usize,
    },

    /// A dense grid whose rows have different lengths.
    #[error("dense row {row} has {found} columns, expected {expected}")]
    RaggedRows {
        /// Index of the first row with the wrong length.
        row: usize,
        /// Length of row 0.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },

    /// The `row_start` array decreases somewhere.
    #[error("row_start is not monotonically non-decreasing at position {position}")]
    NonMonotonicRowStart {
        /// Position in `row_start` where the violation was detected.
        position: usize,
    },

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value, formatted.
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },
}
