//! Shared test helpers for the sparse-sor integration test suite.
//!
//! Provides deterministic random system generators, a dense reference
//! solver, and small vector utilities.

#![allow(dead_code)]

use sparse_sor::types::SparseMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Matrix generators
// ---------------------------------------------------------------------------

/// Triplets of a random strictly diagonally dominant `n x n` matrix.
///
/// Each row has roughly `density * n` off-diagonal entries (at least one
/// when `n > 1`); the diagonal is `1 + sum |off-diagonal|` plus noise.
pub fn random_diag_dominant_triplets(n: usize, density: f64, seed: u64) -> Vec<(usize, usize, f64)> {
    let mut rng = Lcg::new(seed);
    let mut entries = Vec::new();

    for i in 0..n {
        let mut off_diag_sum = 0.0f64;
        for j in 0..n {
            if i != j && rng.next_f64() < density {
                let val = rng.next_f64_range(-1.0, 1.0);
                entries.push((i, j, val));
                off_diag_sum += val.abs();
            }
        }
        if off_diag_sum == 0.0 && n > 1 {
            let val = rng.next_f64_range(0.1, 0.5);
            entries.push((i, (i + 1) % n, val));
            off_diag_sum = val;
        }
        entries.push((i, i, off_diag_sum + 1.0 + rng.next_f64()));
    }

    entries
}

pub fn random_diag_dominant(n: usize, density: f64, seed: u64) -> SparseMatrix {
    SparseMatrix::from_triplets(n, n, random_diag_dominant_triplets(n, density, seed))
        .expect("generated triplets are valid")
}

/// Tridiagonal `n x n` matrix with constant bands.
pub fn tridiagonal(n: usize, lower: f64, diag: f64, upper: f64) -> SparseMatrix {
    let mut entries = Vec::with_capacity(3 * n);
    for i in 0..n {
        if i > 0 {
            entries.push((i, i - 1, lower));
        }
        entries.push((i, i, diag));
        if i + 1 < n {
            entries.push((i, i + 1, upper));
        }
    }
    SparseMatrix::from_triplets(n, n, entries).expect("tridiagonal triplets are valid")
}

/// Deterministic random vector with entries in [-1, 1).
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.next_f64_range(-1.0, 1.0)).collect()
}

/// Random dense grid with roughly `density` non-zero cells.
pub fn random_dense(rows: usize, cols: usize, density: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = Lcg::new(seed);
    (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| {
                    if rng.next_f64() < density {
                        rng.next_f64_range(-10.0, 10.0)
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dense reference solver
// ---------------------------------------------------------------------------

/// Solve `Ax = b` by Gaussian elimination with partial pivoting.
///
/// O(n^3) reference for small systems only.
///
/// # Panics
///
/// Panics if the matrix is singular or dimensions are inconsistent.
pub fn dense_solve(matrix: &SparseMatrix, rhs: &[f64]) -> Vec<f64> {
    let n = matrix.rows();
    assert_eq!(n, matrix.cols(), "dense_solve requires a square matrix");
    assert_eq!(rhs.len(), n, "rhs length must match matrix dimension");

    let mut aug: Vec<Vec<f64>> = matrix
        .to_dense()
        .into_iter()
        .zip(rhs)
        .map(|(mut row, &b)| {
            row.push(b);
            row
        })
        .collect();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }
        assert!(max_val > 1e-15, "matrix is singular or near-singular");
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }
    x
}

// ---------------------------------------------------------------------------
// Vector utilities
// ---------------------------------------------------------------------------

/// Largest absolute component-wise difference.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Dense reference product for cross-checking SpMV.
pub fn dense_matvec(dense: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    dense
        .iter()
        .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
        .collect()
}
