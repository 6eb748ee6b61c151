//! Successive Over-Relaxation for sparse linear systems.
//!
//! This crate solves `Ax = b` where `A` is stored in compressed sparse row
//! form, iterating Gauss-Seidel sweeps with a relaxation factor until the
//! iterates converge, diverge, hit a zero pivot, or exhaust their budget.
//!
//! # Modules
//!
//! | Module | Content |
//! |--------|---------|
//! | [`types`] | [`SparseMatrix`](types::SparseMatrix), [`MatrixSource`](types::MatrixSource), [`StoppingReason`](types::StoppingReason) |
//! | [`vector`] | [`NumericVector`](vector::NumericVector) |
//! | [`sor`] | [`SorSolver`](sor::SorSolver) and the pure sweep/convergence steps |
//! | [`config`] | [`SorConfig`](config::SorConfig) |
//! | [`budget`] | wall-clock deadline and [`CancelToken`](budget::CancelToken) |
//! | [`validation`] | eager input checks |
//! | [`error`] | [`SorError`](error::SorError), [`ValidationError`](error::ValidationError) |
//!
//! Construction-time misuse is an `Err`; every outcome of a solve that ran
//! is a [`StoppingReason`](types::StoppingReason).
//!
//! # Example
//!
//! ```rust
//! use sparse_sor::config::SorConfig;
//! use sparse_sor::sor::SorSolver;
//! use sparse_sor::types::{MatrixSource, SparseMatrix, StoppingReason};
//! use sparse_sor::vector::NumericVector;
//!
//! let a = SparseMatrix::from_source(MatrixSource::Triplets {
//!     rows: 2,
//!     cols: 2,
//!     entries: vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0)],
//! }).unwrap();
//! let b = NumericVector::new(vec![2.0, 2.0]).unwrap();
//!
//! // Row 1 has no diagonal entry.
//! let solver = SorSolver::new(&a, &b, SorConfig::new(100, 1e-4, 1.0)).unwrap();
//! assert_eq!(solver.stopping_reason(), StoppingReason::ZeroOnDiagonal);
//! assert_eq!(solver.iteration_count(), 0);
//! ```

pub mod budget;
pub mod config;
pub mod error;
pub mod sor;
pub mod types;
pub mod validation;
pub mod vector;

pub use config::SorConfig;
pub use error::{SorError, ValidationError};
pub use sor::SorSolver;
pub use types::{MatrixSource, SparseMatrix, StoppingReason};
pub use vector::NumericVector;
