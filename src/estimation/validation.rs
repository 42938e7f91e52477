//! estimation::validation — shared input guards for the estimation subtree.
//!
//! Purpose
//! -------
//! Centralize the checks every estimator entry point needs: lag positivity,
//! matrix squareness and dimension agreement, and stationary-distribution
//! admissibility. Keeping the guards in one place keeps error payloads and
//! messages consistent across the subtree.
//!
//! Conventions
//! -----------
//! - Guards return `EstResult<()>` (or the validated value) and never panic
//!   on user-facing invalid input.
//! - A stationary distribution is admissible when it has the expected
//!   length, every entry is finite and strictly positive, and the entries
//!   sum to 1 within a small absolute tolerance (it is then renormalized
//!   exactly by the caller).

use ndarray::Array1;

use crate::estimation::errors::{EstResult, EstimationError};

/// Absolute tolerance for the sum-to-one check on stationary vectors.
pub const STATDIST_SUM_TOL: f64 = 1e-10;

/// Require `lag >= 1`.
pub fn validate_lag(lag: usize) -> EstResult<()> {
    if lag == 0 {
        return Err(EstimationError::InvalidLag { lag });
    }
    Ok(())
}

/// Require two matrix dimensions to agree.
pub fn require_same_dim(expected: usize, found: usize, context: &'static str) -> EstResult<()> {
    if expected != found {
        return Err(EstimationError::ShapeMismatch { expected, found, context });
    }
    Ok(())
}

/// Validate a user-supplied stationary distribution against dimension `dim`
/// and return an exactly renormalized copy.
///
/// # Errors
/// - `ShapeMismatch` when the length differs from `dim`.
/// - `InvalidStationaryVector` when an entry is non-finite or `<= 0`, or the
///   entries do not sum to 1 within [`STATDIST_SUM_TOL`].
pub fn validate_stationary(mu: &Array1<f64>, dim: usize) -> EstResult<Array1<f64>> {
    require_same_dim(dim, mu.len(), "stationary distribution")?;
    for (i, &v) in mu.iter().enumerate() {
        if !v.is_finite() {
            return Err(EstimationError::InvalidStationaryVector {
                index: i,
                value: v,
                reason: "entries must be finite",
            });
        }
        if v <= 0.0 {
            return Err(EstimationError::InvalidStationaryVector {
                index: i,
                value: v,
                reason: "entries must be strictly positive",
            });
        }
    }
    let total: f64 = mu.sum();
    if (total - 1.0).abs() > STATDIST_SUM_TOL {
        return Err(EstimationError::InvalidStationaryVector {
            index: 0,
            value: total,
            reason: "entries must sum to 1",
        });
    }
    Ok(mu / total)
}
