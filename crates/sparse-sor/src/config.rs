//! Solver configuration.
//!
//! [`SorConfig`] is a plain value: build it once, hand it to a solver, and it
//! stays fixed for that solver's lifetime. It derives serde so that partial
//! documents (e.g. `{"relaxation_factor": 1.4}`) fill the rest from
//! [`Default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::validate_params;

/// Consecutive growing sweeps tolerated before declaring divergence.
pub const DEFAULT_DIVERGENCE_STREAK: usize = 5;

/// Tuning parameters for one SOR solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorConfig {
    /// Upper bound on completed sweeps.
    pub max_iterations: usize,
    /// Absolute tolerance for both stopping tests.
    pub tolerance: f64,
    /// Relaxation factor `w`. `1.0` is plain Gauss-Seidel.
    pub relaxation_factor: f64,
    /// Emit a `trace!` event for every row update.
    pub debug: bool,
    /// Wall-clock limit checked between sweeps.
    pub max_time: Option<Duration>,
    /// Divergence is declared once the iterate delta has grown for more than
    /// this many consecutive sweeps.
    pub divergence_streak: usize,
}

impl Default for SorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
            relaxation_factor: 1.0,
            debug: false,
            max_time: None,
            divergence_streak: DEFAULT_DIVERGENCE_STREAK,
        }
    }
}

impl SorConfig {
    /// Configuration with the three numerical knobs set and everything else
    /// at its default.
    pub fn new(max_iterations: usize, tolerance: f64, relaxation_factor: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            relaxation_factor,
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    pub fn with_divergence_streak(mut self, streak: usize) -> Self {
        self.divergence_streak = streak;
        self
    }

    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] for the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_params(
            self.max_iterations,
            self.tolerance,
            self.relaxation_factor,
            self.divergence_streak,
        )
    }
}
