//! Successive Over-Relaxation solver for sparse linear systems.
//!
//! Solves `Ax = b` by Gauss-Seidel sweeps whose per-row correction is scaled
//! by a relaxation factor `w`:
//!
//! ```text
//! x = 0
//! for k = 1, 2, ...:
//!     for i in 0..n:                       (in place: rows < i already updated)
//!         sum = sum_{j != i} a_ij * x_j
//!         d   = a_ii                       (0 if not stored -> stop)
//!         x_i = x_i + w * ((b_i - sum) / d - x_i)
//!     check convergence against x_{k-1}
//! ```
//!
//! # Stopping
//!
//! After every completed sweep except the first:
//!
//! 1. `delta = ||x_k - x_{k-1}||_1`. If `delta` grew for more than
//!    [`SorConfig::divergence_streak`] consecutive sweeps, or overflowed to
//!    infinity, the sequence is declared divergent.
//! 2. If `delta <= threshold(delta)` the x-sequence has converged.
//! 3. Otherwise if `||b - A x_k||_1 <= threshold(1)` the residual has
//!    converged.
//!
//! with `threshold(v) = tolerance + 4 * eps * |v|`. When the sweep count
//! reaches `max_iterations` the solve stops with
//! [`StoppingReason::MaxIterationsReached`]. A zero pivot stops the solve
//! mid-sweep with [`StoppingReason::ZeroOnDiagonal`].
//!
//! The convergence logic is exposed as the pure functions [`sweep`],
//! [`check_convergence`] and [`step`] over an explicit [`SorState`];
//! [`SorSolver`] drives them to completion under a [`SweepBudget`].

use std::time::Duration;

use tracing::{debug, info, instrument, trace, warn};

use crate::budget::{CancelToken, SweepBudget};
use crate::config::SorConfig;
use crate::error::{SorError, ValidationError};
use crate::types::{ConvergenceInfo, SorReport, SparseMatrix, StoppingReason};
use crate::vector::NumericVector;

/// `2^-52`, the spacing of `f64` values around 1.
pub const MACHINE_EPSILON: f64 = f64::EPSILON;

/// Reference magnitude fed to the threshold for the residual test.
pub const RESIDUAL_REFERENCE: f64 = 1.0;

/// Stopping threshold for a quantity of magnitude `v`.
#[inline]
pub fn stopping_threshold(tolerance: f64, v: f64) -> f64 {
    tolerance + 4.0 * MACHINE_EPSILON * v.abs()
}

// ---------------------------------------------------------------------------
// Iteration state
// ---------------------------------------------------------------------------

/// Mutable state of one solve.
///
/// Created with an all-zero iterate and advanced only by [`step`].
#[derive(Debug, Clone)]
pub struct SorState {
    x: Vec<f64>,
    x_previous: Option<Vec<f64>>,
    iteration: usize,
    stopping_reason: StoppingReason,
    growth_streak: usize,
    previous_delta: f64,
}

impl SorState {
    /// Fresh state for an `n`-row system.
    pub fn new(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            x_previous: None,
            iteration: 0,
            stopping_reason: StoppingReason::Unknown,
            growth_streak: 0,
            previous_delta: f64::INFINITY,
        }
    }

    /// Current iterate.
    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Iterate after the previous completed sweep, if any.
    #[inline]
    pub fn x_previous(&self) -> Option<&[f64]> {
        self.x_previous.as_deref()
    }

    /// Completed sweeps.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[inline]
    pub fn stopping_reason(&self) -> StoppingReason {
        self.stopping_reason
    }

    #[inline]
    pub fn growth_streak(&self) -> usize {
        self.growth_streak
    }

    #[inline]
    pub fn previous_delta(&self) -> f64 {
        self.previous_delta
    }

    /// Record the last finite iterate as the answer after an overflow.
    fn restore_previous(&mut self) {
        match &self.x_previous {
            Some(prev) => self.x.copy_from_slice(prev),
            None => self.x.fill(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure building blocks
// ---------------------------------------------------------------------------

/// Result of a single in-place sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Every row was updated.
    Completed,
    /// `row` had a zero (or unstored) diagonal; rows after it were not
    /// touched.
    ZeroPivot { row: usize },
}

/// Run one SOR sweep over `x` in place.
///
/// `debug` only controls per-row `trace!` output.
///
/// # Panics
///
/// Panics if `x.len()` or `rhs.len()` is smaller than `matrix.rows()`
/// (debug builds assert both lengths are equal).
pub fn sweep(
    matrix: &SparseMatrix,
    rhs: &[f64],
    x: &mut [f64],
    relaxation_factor: f64,
    debug: bool,
) -> SweepOutcome {
    debug_assert_eq!(matrix.rows(), x.len());
    debug_assert_eq!(rhs.len(), x.len());

    for i in 0..matrix.rows() {
        let mut sum = 0.0;
        let mut diagonal = 0.0;
        for (c, v) in matrix.row_entries(i) {
            if c == i {
                diagonal = v;
            } else {
                sum += v * x[c];
            }
        }

        if diagonal == 0.0 {
            return SweepOutcome::ZeroPivot { row: i };
        }

        let adjustment = relaxation_factor * ((rhs[i] - sum) / diagonal - x[i]);
        if debug {
            trace!(
                row = i,
                x_prior = x[i],
                rhs = rhs[i],
                sum,
                diagonal,
                adjustment,
                "row update"
            );
        }
        x[i] += adjustment;
    }

    SweepOutcome::Completed
}

/// Decide whether the solve stops after a completed sweep.
///
/// Updates the divergence streak, `previous_delta` and the `x_previous`
/// snapshot. Returns the terminal reason, if any, together with the
/// iterate delta (`f64::INFINITY` on the first sweep, which never converges).
/// Does not consider `max_iterations`.
pub fn check_convergence(
    state: &mut SorState,
    matrix: &SparseMatrix,
    rhs: &[f64],
    config: &SorConfig,
) -> (Option<StoppingReason>, f64) {
    let Some(prev) = state.x_previous.as_mut() else {
        state.x_previous = Some(state.x.clone());
        return (None, f64::INFINITY);
    };

    let x_delta: f64 = state
        .x
        .iter()
        .zip(prev.iter())
        .map(|(a, b)| (a - b).abs())
        .sum();
    prev.copy_from_slice(&state.x);

    // Finite iterates whose distance overflows are still running away.
    if !x_delta.is_finite() {
        return (Some(StoppingReason::XSequenceDivergence), x_delta);
    }

    if x_delta > state.previous_delta {
        state.growth_streak += 1;
        if state.growth_streak > config.divergence_streak {
            return (Some(StoppingReason::XSequenceDivergence), x_delta);
        }
    } else {
        state.growth_streak = 0;
    }

    if x_delta <= stopping_threshold(config.tolerance, x_delta) {
        return (Some(StoppingReason::XSequenceConvergence), x_delta);
    }

    let residual = matrix.residual_l1(&state.x, rhs);
    if residual <= stopping_threshold(config.tolerance, RESIDUAL_REFERENCE) {
        return (Some(StoppingReason::ResidualConvergence), x_delta);
    }

    state.previous_delta = x_delta;
    (None, x_delta)
}

/// What one [`step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State after the step; [`StoppingReason::Unknown`] means keep going.
    pub reason: StoppingReason,
    /// Iterate delta of the completed sweep, `None` if the sweep aborted.
    pub x_delta: Option<f64>,
}

/// One sweep plus its convergence check.
///
/// Terminal states are absorbing: stepping a finished state changes nothing.
/// If the sweep overflows to a non-finite iterate, the last finite iterate
/// is restored and the sequence is declared divergent.
///
/// # Panics
///
/// Panics as [`sweep`] does when `state` or `rhs` was sized for a different
/// matrix. [`SorSolver`] checks these lengths before stepping.
pub fn step(
    state: &mut SorState,
    matrix: &SparseMatrix,
    rhs: &[f64],
    config: &SorConfig,
) -> StepOutcome {
    if state.stopping_reason.is_terminal() {
        return StepOutcome {
            reason: state.stopping_reason,
            x_delta: None,
        };
    }

    let outcome = sweep(
        matrix,
        rhs,
        &mut state.x,
        config.relaxation_factor,
        config.debug,
    );

    if state.x.iter().any(|v| !v.is_finite()) {
        warn!(iteration = state.iteration, "iterate overflowed");
        state.restore_previous();
        state.stopping_reason = StoppingReason::XSequenceDivergence;
        return StepOutcome {
            reason: state.stopping_reason,
            x_delta: None,
        };
    }

    if let SweepOutcome::ZeroPivot { row } = outcome {
        warn!(row, iteration = state.iteration, "zero on diagonal");
        state.stopping_reason = StoppingReason::ZeroOnDiagonal;
        return StepOutcome {
            reason: state.stopping_reason,
            x_delta: None,
        };
    }

    state.iteration += 1;
    let (reason, x_delta) = check_convergence(state, matrix, rhs, config);
    debug!(
        iteration = state.iteration,
        x_delta,
        growth_streak = state.growth_streak,
        "sor sweep"
    );

    state.stopping_reason = match reason {
        Some(reason) => reason,
        None if state.iteration >= config.max_iterations => StoppingReason::MaxIterationsReached,
        None => StoppingReason::Unknown,
    };

    StepOutcome {
        reason: state.stopping_reason,
        x_delta: Some(x_delta),
    }
}

// ---------------------------------------------------------------------------
// SorSolver
// ---------------------------------------------------------------------------

/// A finished SOR solve.
///
/// Construction validates the inputs and runs the whole iteration; the
/// result is then read through the accessors. The matrix and right-hand side
/// are only borrowed, so one matrix can back many solves.
///
/// # Example
///
/// ```rust
/// use sparse_sor::config::SorConfig;
/// use sparse_sor::sor::SorSolver;
/// use sparse_sor::types::{SparseMatrix, StoppingReason};
/// use sparse_sor::vector::NumericVector;
///
/// let a = SparseMatrix::from_dense(&[
///     vec![3.0, -1.0, 1.0],
///     vec![-1.0, 3.0, -1.0],
///     vec![1.0, -1.0, 3.0],
/// ]).unwrap();
/// let b = NumericVector::named("b", vec![-1.0, 7.0, -7.0]).unwrap();
///
/// let solver = SorSolver::new(&a, &b, SorConfig::new(10, 1e-4, 1.0)).unwrap();
/// assert!(solver.stopping_reason().is_converged());
/// assert!((solver.solution().values()[1] - 2.0).abs() < 1e-2);
/// ```
#[derive(Debug)]
pub struct SorSolver<'a> {
    matrix: &'a SparseMatrix,
    rhs: &'a NumericVector,
    config: SorConfig,
    state: SorState,
    history: Vec<ConvergenceInfo>,
    wall_time: Duration,
}

impl<'a> SorSolver<'a> {
    /// Validate and solve `matrix * x = rhs`.
    ///
    /// # Errors
    ///
    /// - [`SorError::NonConformable`] if `matrix.rows() != rhs.len()`.
    /// - [`SorError::InvalidInput`] for a non-square matrix or an invalid
    ///   configuration.
    ///
    /// A matrix that is not strictly diagonally dominant only logs a warning.
    pub fn new(
        matrix: &'a SparseMatrix,
        rhs: &'a NumericVector,
        config: SorConfig,
    ) -> Result<Self, SorError> {
        Self::with_cancel(matrix, rhs, config, None)
    }

    /// Like [`new`](Self::new), but also stops at the first sweep boundary
    /// after `cancel` fires.
    #[instrument(
        skip_all,
        fields(rows = matrix.rows(), nnz = matrix.nnz(), omega = config.relaxation_factor)
    )]
    pub fn with_cancel(
        matrix: &'a SparseMatrix,
        rhs: &'a NumericVector,
        config: SorConfig,
        cancel: Option<CancelToken>,
    ) -> Result<Self, SorError> {
        if matrix.rows() != rhs.len() {
            return Err(SorError::NonConformable {
                expected: matrix.rows(),
                found: rhs.len(),
            });
        }
        if !matrix.is_square() {
            return Err(ValidationError::DimensionMismatch(format!(
                "solver requires a square matrix but got {}x{}",
                matrix.rows(),
                matrix.cols(),
            ))
            .into());
        }
        config.validate()?;

        if !matrix.is_strictly_row_diagonally_dominant() {
            warn!("matrix is not strictly row diagonally dominant; convergence is not guaranteed");
        }
        if !rhs.is_empty() && rhs.values().iter().all(|&v| v == 0.0) {
            warn!("rhs vector is all zeros; solution will be trivially zero");
        }

        let mut solver = Self {
            matrix,
            rhs,
            state: SorState::new(matrix.rows()),
            history: Vec::with_capacity(config.max_iterations.min(256)),
            config,
            wall_time: Duration::ZERO,
        };
        solver.run(SweepBudget::new(solver.config.max_time, cancel));
        Ok(solver)
    }

    fn run(&mut self, budget: SweepBudget) {
        if self.matrix.rows() == 0 {
            self.state.stopping_reason = StoppingReason::XSequenceConvergence;
        }

        while !self.state.stopping_reason.is_terminal() {
            if let Some(reason) = budget.check_sweep() {
                self.state.stopping_reason = reason;
                break;
            }
            let outcome = step(&mut self.state, self.matrix, self.rhs.values(), &self.config);
            if let Some(x_delta) = outcome.x_delta {
                self.history.push(ConvergenceInfo {
                    iteration: self.state.iteration,
                    x_delta,
                });
            }
        }

        self.wall_time = budget.elapsed();
        info!(
            reason = %self.state.stopping_reason,
            iterations = self.state.iteration,
            wall_time = ?self.wall_time,
            "sor solve finished"
        );
    }

    /// Copy of the final iterate.
    pub fn solution(&self) -> NumericVector {
        NumericVector::from_finite(None, self.state.x.clone())
    }

    /// Completed sweeps. An aborted sweep is not counted.
    #[inline]
    pub fn iteration_count(&self) -> usize {
        self.state.iteration
    }

    #[inline]
    pub fn stopping_reason(&self) -> StoppingReason {
        self.state.stopping_reason
    }

    /// `sum_i |b_i - (A x)_i|` for the final iterate.
    pub fn residual_sum(&self) -> f64 {
        self.matrix.residual_l1(&self.state.x, self.rhs.values())
    }

    /// One entry per completed sweep.
    #[inline]
    pub fn history(&self) -> &[ConvergenceInfo] {
        &self.history
    }

    #[inline]
    pub fn wall_time(&self) -> Duration {
        self.wall_time
    }

    #[inline]
    pub fn config(&self) -> &SorConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &SorState {
        &self.state
    }

    /// Serialisable summary of the solve.
    pub fn report(&self) -> SorReport {
        SorReport {
            solution_values: self.state.x.clone(),
            stopping_reason: self.state.stopping_reason,
            iteration_count: self.state.iteration,
            residual_sum: self.residual_sum(),
        }
    }
}

/// Solve and return only the report.
pub fn solve(
    matrix: &SparseMatrix,
    rhs: &NumericVector,
    config: SorConfig,
) -> Result<SorReport, SorError> {
    SorSolver::new(matrix, rhs, config).map(|s| s.report())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
