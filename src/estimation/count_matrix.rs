//! estimation::count_matrix — transition counting on discretized trajectories.
//!
//! Purpose
//! -------
//! Turn one or more integer-valued discretized trajectories into a sparse
//! transition count matrix at a fixed lag. `C[i][j]` is the number of
//! observed transitions from state `i` to state `j` exactly `lag` steps
//! apart.
//!
//! Key behaviors
//! -------------
//! - Two counting modes: **sliding window** counts every pair
//!   `(x_t, x_{t+lag})` for `0 <= t < L - lag` (overlapping windows);
//!   **strided** counts only pairs starting at `t = 0, lag, 2*lag, ...`
//!   (disjoint windows).
//! - Multiple trajectories are counted independently and summed; a
//!   trajectory boundary never contributes a transition.
//! - The matrix dimension is `1 + max observed state index` across all
//!   inputs, including states observed only in trajectories too short to
//!   produce counts (an observed state is part of the state space even when
//!   it contributes no transition).
//!
//! Invariants & assumptions
//! ------------------------
//! - For a single trajectory of length `L >= lag + 1` in sliding mode the
//!   total count mass is exactly `L - lag`; in strided mode it is
//!   `floor((L - 1) / lag)`.
//! - An all-zero count matrix is not itself an error; the error conditions
//!   are a zero lag and inputs where *no* trajectory is long enough for a
//!   single count.
//!
//! Downstream usage
//! ----------------
//! - The resulting [`SquareMatrix::Sparse`] feeds `connectivity` for
//!   component analysis, `prior` for regularization, and
//!   `transition_matrix` for estimation.

use std::collections::HashMap;

use crate::estimation::{
    errors::{EstResult, EstimationError},
    matrix::{CooMatrix, SquareMatrix},
    validation::validate_lag,
};

/// Count transitions of a single discretized trajectory at a fixed lag.
///
/// Parameters
/// ----------
/// - `dtraj`: discretized trajectory, a sequence of state indices.
/// - `lag`: lag time in trajectory steps, `>= 1`.
/// - `sliding`: sliding-window counting when `true`, strided counting
///   otherwise.
///
/// Returns
/// -------
/// `EstResult<SquareMatrix>`
///   Sparse count matrix of dimension `1 + max(dtraj)`.
///
/// Errors
/// ------
/// - `EstimationError::InvalidLag` when `lag == 0`.
/// - `EstimationError::DegenerateData` when `dtraj.len() <= lag`, so not a
///   single transition can be counted.
pub fn count_matrix(dtraj: &[usize], lag: usize, sliding: bool) -> EstResult<SquareMatrix> {
    count_matrix_mult(std::slice::from_ref(&dtraj), lag, sliding)
}

/// Count transitions of several trajectories at a fixed lag and sum them.
///
/// Counting each trajectory separately and summing is equivalent to
/// concatenating the transition *events*, not the trajectories: no spurious
/// transition is introduced at a trajectory boundary.
///
/// Parameters
/// ----------
/// - `dtrajs`: list of discretized trajectories.
/// - `lag`: lag time in trajectory steps, `>= 1`.
/// - `sliding`: sliding-window counting when `true`, strided counting
///   otherwise.
///
/// Returns
/// -------
/// `EstResult<SquareMatrix>`
///   Sparse count matrix sized by the largest state index observed in any
///   trajectory. Trajectories shorter than `lag + 1` contribute states to
///   the dimension but no counts.
///
/// Errors
/// ------
/// - `EstimationError::InvalidLag` when `lag == 0`.
/// - `EstimationError::DegenerateData` when no trajectory has length
///   `>= lag + 1`.
pub fn count_matrix_mult<T: AsRef<[usize]>>(
    dtrajs: &[T], lag: usize, sliding: bool,
) -> EstResult<SquareMatrix> {
    validate_lag(lag)?;
    if !dtrajs.iter().any(|t| t.as_ref().len() > lag) {
        return Err(EstimationError::DegenerateData {
            reason: "no trajectory is longer than the lag",
        });
    }

    let mut counts: HashMap<(usize, usize), f64> = HashMap::new();
    let mut max_state: usize = 0;
    for dtraj in dtrajs {
        let dtraj = dtraj.as_ref();
        if let Some(&m) = dtraj.iter().max() {
            max_state = max_state.max(m);
        }
        if dtraj.len() > lag {
            count_single(dtraj, lag, sliding, &mut counts);
        }
    }

    let dim = max_state + 1;
    let coo = CooMatrix::from_triplets(dim, counts.into_iter().map(|((i, j), v)| (i, j, v)))?;
    Ok(SquareMatrix::Sparse(coo))
}

/// Milestoning count matrix on core sets.
///
/// Explicitly unsupported: this routine exists so that callers hit a loud,
/// typed failure instead of a silent approximation.
///
/// # Errors
/// - Always `EstimationError::NotImplemented`.
pub fn count_matrix_cores<T: AsRef<[usize]>>(
    _dtrajs: &[T], _cores: &[usize], _lag: usize, _sliding: bool,
) -> EstResult<SquareMatrix> {
    Err(EstimationError::NotImplemented { what: "milestoning counts on core sets" })
}

// ---- Helper methods ----

/// Accumulate the transition pairs of one trajectory into `counts`.
///
/// Sliding mode walks every start index; strided mode advances by `lag` so
/// windows are disjoint. Callers guarantee `dtraj.len() > lag`.
fn count_single(dtraj: &[usize], lag: usize, sliding: bool, counts: &mut HashMap<(usize, usize), f64>) {
    let step = if sliding { 1 } else { lag };
    let mut t = 0;
    while t + lag < dtraj.len() {
        *counts.entry((dtraj[t], dtraj[t + lag])).or_insert(0.0) += 1.0;
        t += step;
    }
}
