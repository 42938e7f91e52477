//! diagnostics — structured warnings carried inside estimation outcomes.
//!
//! Purpose
//! -------
//! Collect the non-fatal conditions that estimators want to surface to the
//! caller without aborting: silent sparsity changes, iteration caps reached
//! before the convergence tolerance, and trajectories skipped for being too
//! short. Warnings travel inside the outcome structs returned by the
//! estimators rather than through any process-wide channel, so a caller can
//! inspect, log, or ignore them per call.
//!
//! Conventions
//! -----------
//! - A [`Warning`] never replaces an error: conditions that invalidate the
//!   result are reported through the subtree error enums instead.
//! - Warnings are ordinary values (`Clone`, `PartialEq`) so tests can assert
//!   on them directly.

use std::fmt;

/// Non-fatal diagnostic emitted by an estimation run.
///
/// Variants
/// --------
/// - `SparseDensified`: an operation on a sparse input produced a dense
///   result by construction (e.g. a constant prior touches every entry).
/// - `NotConverged`: an iterative estimator exhausted its iteration budget
///   before the error norm fell below the tolerance. The partial result is
///   still returned; the caller decides whether it is acceptable.
/// - `SkippedTrajectories`: input trajectories too short for the configured
///   lag were excluded from estimation. Indices refer to the caller's input
///   order.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Result is dense although the input was sparse.
    SparseDensified { context: &'static str },

    /// Iteration cap reached before the tolerance was met.
    NotConverged { iterations: usize, error: f64, tolerance: f64 },

    /// Trajectories excluded for being shorter than the lag.
    SkippedTrajectories { indices: Vec<usize> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SparseDensified { context } => {
                write!(f, "Result of {context} is a dense matrix for sparse input")
            }
            Warning::NotConverged { iterations, error, tolerance } => {
                write!(
                    f,
                    "Iteration cap {iterations} reached with error {error:e} above tolerance {tolerance:e}"
                )
            }
            Warning::SkippedTrajectories { indices } => {
                write!(f, "Skipped {} trajectories shorter than the lag: {indices:?}", indices.len())
            }
        }
    }
}
