//! estimation::transition_matrix — maximum-likelihood transition matrices.
//!
//! Purpose
//! -------
//! Estimate a row-stochastic transition matrix `T` from a count matrix `C`,
//! optionally constrained to detailed balance (reversibility), optionally
//! with a fixed stationary distribution. All entry points dispatch once on
//! the dense/sparse representation and return the result in the same
//! representation as the input.
//!
//! Key behaviors
//! -------------
//! - **Nonreversible, free pi**: closed-form row normalization
//!   `T[i][j] = C[i][j] / sum_k C[i][k]`. Rows whose counts are all zero
//!   are left as all-zero rows (documented policy; no division by zero).
//! - **Reversible, free pi**: fixed-point iteration over the symmetric
//!   matrix `X` of absolute transition probabilities,
//!   `x_ij <- (c_ij + c_ji) / (c_i/x_i + c_j/x_j)`, with `c_i` the count
//!   row sums and `x_i` the current row sums of `X`. After each sweep `X`
//!   is renormalized to unit mass so `pi = rowsums(X)`, and convergence is
//!   measured on the relative change vector
//!   `e_i = (pi_i_new - pi_i_old) / (pi_i_new + pi_i_old)`: the iteration
//!   stops when `||e||_2 < maxerr` or after `maxiter` sweeps.
//! - **Reversible, fixed pi**: Lagrange-multiplier fixed point on
//!   `lambda`, `lambda_i <- sum_j B_ij mu_j lambda_i /
//!   (mu_j lambda_i + mu_i lambda_j)` with `B = C + C^T`, converging on
//!   `||lambda_new - lambda_old||_2 < maxerr`. The final matrix
//!   `T_ij = B_ij mu_j / (lambda_i mu_j + lambda_j mu_i)` satisfies
//!   detailed balance with the supplied `mu` exactly by construction; the
//!   row sums approach 1 as the iteration converges.
//! - **Nonreversible, fixed pi**: explicitly unsupported, fails with
//!   [`EstimationError::NotImplemented`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Reaching `maxiter` without meeting `maxerr` is *not* an error: the
//!   outcome carries `converged = false` and a [`Warning::NotConverged`],
//!   and the caller decides whether the partial result is acceptable.
//! - Both reversible paths require strictly positive count row sums
//!   ([`EstimationError::ZeroRowSum`] otherwise); the detailed-balance
//!   likelihood is unbounded or ill-defined on states that are never left.
//! - Outputs never alias inputs; sparse results are freshly built.
//!
//! Conventions
//! -----------
//! - `pi`/`mu` denote stationary distributions: nonnegative, summing to 1.
//! - Likelihood histories report `sum_ij C_ij ln T_ij` over positive `T`
//!   entries, one value per iteration, only when `return_conv` is set.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the zero-row policy, row-stochasticity, detailed
//!   balance of both reversible paths, the 2x2 equivalence of reversible
//!   and nonreversible estimates, iteration-cap diagnostics, and the
//!   unsupported combination.

use ndarray::{Array1, Array2, Axis};

use crate::diagnostics::Warning;
use crate::estimation::{
    errors::{EstResult, EstimationError},
    matrix::{CooMatrix, SquareMatrix},
    validation::validate_stationary,
};

/// Default iteration cap for the reversible fixed-point iterations.
pub const DEFAULT_MAXITER: usize = 1_000_000;

/// Default convergence tolerance on the pi-change (or lambda-change) norm.
pub const DEFAULT_MAXERR: f64 = 1e-8;

/// Iteration cap for the damped power iteration used to initialize the
/// reversible estimate from the nonreversible stationary distribution.
const POWER_ITER_CAP: usize = 10_000;

/// Absolute L1 tolerance for the damped power iteration.
const POWER_ITER_TOL: f64 = 1e-14;

/// Configuration for [`transition_matrix`].
///
/// Fields
/// ------
/// - `xinit`: optional initial matrix of absolute transition probabilities
///   for the reversible free-pi iteration. When absent, the iteration
///   starts from `diag(pi0) * T0` with `T0` the nonreversible estimate and
///   `pi0` its stationary distribution.
/// - `maxiter`: iteration cap, default [`DEFAULT_MAXITER`].
/// - `maxerr`: convergence tolerance on the change norm, default
///   [`DEFAULT_MAXERR`].
/// - `return_statdist`: also return the stationary distribution.
/// - `return_conv`: also return likelihood and pi-change histories.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorOptions {
    pub xinit: Option<Array2<f64>>,
    pub maxiter: usize,
    pub maxerr: f64,
    pub return_statdist: bool,
    pub return_conv: bool,
}

impl EstimatorOptions {
    /// Construct validated estimator options.
    ///
    /// # Errors
    /// - `EstimationError::InvalidMaxIter` when `maxiter == 0`.
    /// - `EstimationError::InvalidMaxErr` when `maxerr` is not finite and
    ///   strictly positive.
    /// - `EstimationError::InvalidXinit` when `xinit` is non-square or
    ///   contains negative or non-finite entries (its dimension is checked
    ///   against the count matrix at estimation time).
    pub fn new(
        xinit: Option<Array2<f64>>, maxiter: usize, maxerr: f64, return_statdist: bool,
        return_conv: bool,
    ) -> EstResult<Self> {
        if maxiter == 0 {
            return Err(EstimationError::InvalidMaxIter { maxiter });
        }
        if !maxerr.is_finite() || maxerr <= 0.0 {
            return Err(EstimationError::InvalidMaxErr { maxerr });
        }
        if let Some(x0) = &xinit {
            if x0.nrows() != x0.ncols() {
                return Err(EstimationError::InvalidXinit { reason: "matrix must be square" });
            }
            if x0.iter().any(|&v| !v.is_finite() || v < 0.0) {
                return Err(EstimationError::InvalidXinit {
                    reason: "entries must be finite and nonnegative",
                });
            }
        }
        Ok(Self { xinit, maxiter, maxerr, return_statdist, return_conv })
    }
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            xinit: None,
            maxiter: DEFAULT_MAXITER,
            maxerr: DEFAULT_MAXERR,
            return_statdist: false,
            return_conv: false,
        }
    }
}

/// Immutable outcome of a transition-matrix estimation.
///
/// - `transition_matrix`: the estimate, in the representation of the input.
/// - `stationary_distribution`: present when `return_statdist` was set.
/// - `likelihood_history` / `pi_change_history`: present when `return_conv`
///   was set and the path is iterative; one entry per iteration.
/// - `converged`: `false` only when an iterative path hit `maxiter` first.
/// - `iterations`: number of iterations performed (0 for closed forms).
/// - `warnings`: structured diagnostics, see [`Warning`].
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateOutcome {
    pub transition_matrix: SquareMatrix,
    pub stationary_distribution: Option<Array1<f64>>,
    pub likelihood_history: Option<Vec<f64>>,
    pub pi_change_history: Option<Vec<f64>>,
    pub converged: bool,
    pub iterations: usize,
    pub warnings: Vec<Warning>,
}

/// Estimate a transition matrix from a count matrix.
///
/// Parameters
/// ----------
/// - `c`: count matrix (dense or sparse); the output mirrors its
///   representation.
/// - `reversible`: restrict the estimate to detailed-balance matrices.
/// - `mu`: optional fixed stationary distribution (reversible only).
/// - `opts`: iteration budget, tolerance, and output selection.
///
/// Returns
/// -------
/// `EstResult<EstimateOutcome>`
///   The maximum-likelihood estimate plus requested diagnostics.
///
/// Errors
/// ------
/// - `EstimationError::NotImplemented` for nonreversible estimation with a
///   fixed stationary distribution.
/// - `EstimationError::ZeroRowSum` when a reversible path encounters a row
///   of `C` with no counts.
/// - `EstimationError::InvalidStationaryVector` / `ShapeMismatch` for an
///   inadmissible `mu`, `InvalidXinit` for a misshaped `xinit`.
pub fn transition_matrix(
    c: &SquareMatrix, reversible: bool, mu: Option<&Array1<f64>>, opts: &EstimatorOptions,
) -> EstResult<EstimateOutcome> {
    match (reversible, mu) {
        (false, Some(_)) => Err(EstimationError::NotImplemented {
            what: "nonreversible estimation with fixed stationary distribution",
        }),
        (false, None) => estimate_nonreversible(c, opts),
        (true, None) => estimate_reversible(c, opts),
        (true, Some(mu)) => estimate_reversible_fixpi(c, mu, opts),
    }
}

// ---- Nonreversible estimation ----

/// Row-normalize the count matrix, leaving zero rows as zero rows.
fn estimate_nonreversible(c: &SquareMatrix, opts: &EstimatorOptions) -> EstResult<EstimateOutcome> {
    let sums = c.row_sums();
    let t = match c {
        SquareMatrix::Dense(m) => {
            let mut t = m.clone();
            for (mut row, &s) in t.rows_mut().into_iter().zip(sums.iter()) {
                if s > 0.0 {
                    row /= s;
                }
            }
            SquareMatrix::Dense(t)
        }
        SquareMatrix::Sparse(m) => {
            let triplets = m
                .iter()
                .filter(|&(i, _, _)| sums[i] > 0.0)
                .map(|(i, j, v)| (i, j, v / sums[i]));
            SquareMatrix::Sparse(CooMatrix::from_triplets(m.dim(), triplets)?)
        }
    };
    let stationary_distribution = opts
        .return_statdist
        .then(|| stationary_distribution_power(&t.to_dense_array()));
    Ok(EstimateOutcome {
        transition_matrix: t,
        stationary_distribution,
        likelihood_history: None,
        pi_change_history: None,
        converged: true,
        iterations: 0,
        warnings: Vec::new(),
    })
}

// ---- Reversible estimation, free stationary distribution ----

/// Fixed-point iteration on the symmetric matrix of absolute probabilities.
fn estimate_reversible(c: &SquareMatrix, opts: &EstimatorOptions) -> EstResult<EstimateOutcome> {
    let dense_c = c.to_dense_array();
    let n = dense_c.nrows();
    let csum = require_positive_row_sums(&dense_c)?;
    let b = &dense_c + &dense_c.t();

    // initial X: user supplied, or diag(pi0) * T0 from the nonreversible
    // estimate
    let mut x = match &opts.xinit {
        Some(x0) => {
            if x0.nrows() != n {
                return Err(EstimationError::InvalidXinit {
                    reason: "dimension differs from the count matrix",
                });
            }
            x0.clone()
        }
        None => {
            let mut t0 = dense_c.clone();
            for (mut row, &s) in t0.rows_mut().into_iter().zip(csum.iter()) {
                row /= s;
            }
            let pi0 = stationary_distribution_power(&t0);
            let mut x0 = t0;
            for (mut row, &p) in x0.rows_mut().into_iter().zip(pi0.iter()) {
                row *= p;
            }
            x0
        }
    };
    let mass = x.sum();
    if mass <= 0.0 {
        return Err(EstimationError::InvalidXinit { reason: "total mass must be positive" });
    }
    x /= mass;
    let mut xsum = x.sum_axis(Axis(1));

    let mut likelihood_history = opts.return_conv.then(Vec::new);
    let mut pi_change_history = opts.return_conv.then(Vec::new);
    let mut converged = false;
    let mut iterations = 0usize;
    let mut last_err = f64::INFINITY;

    while iterations < opts.maxiter {
        let q = &csum / &xsum;
        let mut x_new = Array2::from_shape_fn((n, n), |(i, j)| b[[i, j]] / (q[i] + q[j]));
        let mass = x_new.sum();
        x_new /= mass;
        let xsum_new = x_new.sum_axis(Axis(1));

        let err = pi_change_norm(&xsum, &xsum_new);
        if let Some(hist) = pi_change_history.as_mut() {
            hist.push(err);
        }
        if let Some(hist) = likelihood_history.as_mut() {
            hist.push(loglik_dense(&dense_c, &x_new, &xsum_new));
        }

        x = x_new;
        xsum = xsum_new;
        iterations += 1;
        last_err = err;
        if err < opts.maxerr {
            converged = true;
            break;
        }
    }

    let mut warnings = Vec::new();
    if !converged {
        warnings.push(Warning::NotConverged {
            iterations,
            error: last_err,
            tolerance: opts.maxerr,
        });
    }

    let mut t = x;
    for (mut row, &s) in t.rows_mut().into_iter().zip(xsum.iter()) {
        row /= s;
    }
    Ok(EstimateOutcome {
        transition_matrix: c.match_representation(t),
        stationary_distribution: opts.return_statdist.then(|| xsum.clone()),
        likelihood_history,
        pi_change_history,
        converged,
        iterations,
        warnings,
    })
}

// ---- Reversible estimation, fixed stationary distribution ----

/// Lagrange-multiplier fixed point holding the stationary distribution.
fn estimate_reversible_fixpi(
    c: &SquareMatrix, mu: &Array1<f64>, opts: &EstimatorOptions,
) -> EstResult<EstimateOutcome> {
    let dense_c = c.to_dense_array();
    let n = dense_c.nrows();
    let mu = validate_stationary(mu, n)?;
    let csum = require_positive_row_sums(&dense_c)?;
    let b = &dense_c + &dense_c.t();

    let mut lambda = csum.clone();
    let mut likelihood_history = opts.return_conv.then(Vec::new);
    let mut pi_change_history = opts.return_conv.then(Vec::new);
    let mut converged = false;
    let mut iterations = 0usize;
    let mut last_err = f64::INFINITY;

    while iterations < opts.maxiter {
        let lambda_new = Array1::from_shape_fn(n, |i| {
            (0..n)
                .map(|j| {
                    let denom = mu[j] * lambda[i] + mu[i] * lambda[j];
                    if denom > 0.0 { b[[i, j]] * mu[j] * lambda[i] / denom } else { 0.0 }
                })
                .sum()
        });
        let err = (&lambda - &lambda_new).mapv(|d| d * d).sum().sqrt();
        if let Some(hist) = pi_change_history.as_mut() {
            hist.push(err);
        }
        if let Some(hist) = likelihood_history.as_mut() {
            let t = fixpi_transition(&b, &mu, &lambda_new);
            hist.push(loglik_raw(&dense_c, &t));
        }

        lambda = lambda_new;
        iterations += 1;
        last_err = err;
        if err < opts.maxerr {
            converged = true;
            break;
        }
    }

    let mut warnings = Vec::new();
    if !converged {
        warnings.push(Warning::NotConverged {
            iterations,
            error: last_err,
            tolerance: opts.maxerr,
        });
    }

    let t = fixpi_transition(&b, &mu, &lambda);
    Ok(EstimateOutcome {
        transition_matrix: c.match_representation(t),
        stationary_distribution: opts.return_statdist.then(|| mu.clone()),
        likelihood_history,
        pi_change_history,
        converged,
        iterations,
        warnings,
    })
}

// ---- Helper methods ----

/// Row sums of `c`, failing on the first non-positive row.
fn require_positive_row_sums(c: &Array2<f64>) -> EstResult<Array1<f64>> {
    let sums = c.sum_axis(Axis(1));
    for (i, &s) in sums.iter().enumerate() {
        if s <= 0.0 {
            return Err(EstimationError::ZeroRowSum { row: i });
        }
    }
    Ok(sums)
}

/// Euclidean norm of the relative stationary-probability changes
/// `e_i = (pi_old_i - pi_new_i) / (pi_old_i + pi_new_i)`.
///
/// The relative form tracks changes in small probabilities that an absolute
/// norm would miss.
fn pi_change_norm(old: &Array1<f64>, new: &Array1<f64>) -> f64 {
    old.iter()
        .zip(new.iter())
        .map(|(&a, &b)| {
            let denom = a + b;
            if denom > 0.0 { ((a - b) / denom).powi(2) } else { 0.0 }
        })
        .sum::<f64>()
        .sqrt()
}

/// Transition matrix of the fixed-pi parameterization for multipliers
/// `lambda`: `T_ij = B_ij mu_j / (lambda_i mu_j + lambda_j mu_i)`.
fn fixpi_transition(b: &Array2<f64>, mu: &Array1<f64>, lambda: &Array1<f64>) -> Array2<f64> {
    let n = mu.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        let denom = lambda[i] * mu[j] + lambda[j] * mu[i];
        if denom > 0.0 { b[[i, j]] * mu[j] / denom } else { 0.0 }
    })
}

/// Log-likelihood `sum_ij c_ij ln(x_ij / xsum_i)` of the normalized matrix
/// of absolute probabilities.
fn loglik_dense(c: &Array2<f64>, x: &Array2<f64>, xsum: &Array1<f64>) -> f64 {
    let mut ll = 0.0;
    for ((i, j), &cij) in c.indexed_iter() {
        if cij != 0.0 {
            let tij = x[[i, j]] / xsum[i];
            if tij > 0.0 {
                ll += cij * tij.ln();
            }
        }
    }
    ll
}

/// Log-likelihood `sum_ij c_ij ln t_ij` over positive entries of `t`.
fn loglik_raw(c: &Array2<f64>, t: &Array2<f64>) -> f64 {
    let mut ll = 0.0;
    for ((i, j), &cij) in c.indexed_iter() {
        if cij != 0.0 && t[[i, j]] > 0.0 {
            ll += cij * t[[i, j]].ln();
        }
    }
    ll
}

/// Stationary distribution of a row-stochastic matrix by damped power
/// iteration `x <- (x + xT) / 2`, renormalized each step.
///
/// The damping removes periodicity, so the iteration converges on any
/// chain; on reducible chains it settles on one stationary mixture, which
/// is sufficient for its use as an iteration starting point.
fn stationary_distribution_power(t: &Array2<f64>) -> Array1<f64> {
    let n = t.nrows();
    let mut x = Array1::from_elem(n, 1.0 / n as f64);
    for _ in 0..POWER_ITER_CAP {
        let stepped = x.dot(t);
        let mut x_new = (&x + &stepped) * 0.5;
        let total = x_new.sum();
        if total > 0.0 {
            x_new /= total;
        }
        let delta = (&x_new - &x).mapv(f64::abs).sum();
        x = x_new;
        if delta < POWER_ITER_TOL {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::count_matrix::count_matrix;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Option validation, the nonreversible closed form (including the
    // zero-row policy and sparse mirroring), detailed balance and
    // stochasticity of both reversible paths, the 2x2 reversible =
    // nonreversible identity, convergence diagnostics, and the unsupported
    // nonreversible fixed-pi combination.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-7;

    fn detailed_balance_defect(t: &Array2<f64>, pi: &Array1<f64>) -> f64 {
        let n = t.nrows();
        let mut defect: f64 = 0.0;
        for i in 0..n {
            for j in 0..n {
                defect = defect.max((pi[i] * t[[i, j]] - pi[j] * t[[j, i]]).abs());
            }
        }
        defect
    }

    #[test]
    // Purpose
    // -------
    // Option constructors reject a zero iteration cap and non-positive or
    // non-finite tolerances.
    //
    // Given
    // -----
    // - Invalid maxiter/maxerr/xinit values.
    //
    // Expect
    // ------
    // - The matching error variants; the default options are valid.
    fn estimator_options_are_validated() {
        assert!(matches!(
            EstimatorOptions::new(None, 0, 1e-8, false, false).unwrap_err(),
            EstimationError::InvalidMaxIter { .. }
        ));
        assert!(matches!(
            EstimatorOptions::new(None, 10, -1.0, false, false).unwrap_err(),
            EstimationError::InvalidMaxErr { .. }
        ));
        assert!(matches!(
            EstimatorOptions::new(Some(Array2::zeros((2, 3))), 10, 1e-8, false, false)
                .unwrap_err(),
            EstimationError::InvalidXinit { .. }
        ));
        let defaults = EstimatorOptions::default();
        assert_eq!(defaults.maxiter, DEFAULT_MAXITER);
        assert_eq!(defaults.maxerr, DEFAULT_MAXERR);
    }

    #[test]
    // Purpose
    // -------
    // The nonreversible estimate row-normalizes counts; the canonical
    // trajectory yields T[0] = [0.5, 0.5].
    //
    // Given
    // -----
    // - Counts from [0,0,1,1,0,0,1,1] at lag 1, sliding.
    //
    // Expect
    // ------
    // - Row-stochastic T with first row [0.5, 0.5], sparse like its input.
    fn nonreversible_normalizes_rows() {
        // Arrange
        let c = count_matrix(&[0usize, 0, 1, 1, 0, 0, 1, 1], 1, true).unwrap();

        // Act
        let outcome = transition_matrix(&c, false, None, &EstimatorOptions::default()).unwrap();

        // Assert
        assert!(outcome.transition_matrix.is_sparse());
        let t = outcome.transition_matrix.to_dense_array();
        assert_relative_eq!(t[[0, 0]], 0.5, epsilon = TOL);
        assert_relative_eq!(t[[0, 1]], 0.5, epsilon = TOL);
        for row in t.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = TOL);
        }
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    // Purpose
    // -------
    // A row with no counts stays an all-zero row instead of producing NaNs
    // or a fabricated uniform row.
    //
    // Given
    // -----
    // - A dense 3x3 count matrix whose middle row is zero.
    //
    // Expect
    // ------
    // - Zero middle row; the other rows are stochastic; representation
    //   stays dense.
    fn nonreversible_leaves_zero_rows() {
        // Arrange
        let c = SquareMatrix::dense(array![[1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 2.0]])
            .unwrap();

        // Act
        let outcome = transition_matrix(&c, false, None, &EstimatorOptions::default()).unwrap();

        // Assert
        let t = outcome.transition_matrix.to_dense_array();
        assert!(!outcome.transition_matrix.is_sparse());
        assert!(t.row(1).iter().all(|&v| v == 0.0));
        assert_relative_eq!(t.row(0).sum(), 1.0, epsilon = TOL);
        assert_relative_eq!(t.row(2).sum(), 1.0, epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // For two states every stochastic matrix is reversible, so the
    // reversible estimate must coincide with plain row normalization.
    //
    // Given
    // -----
    // - The 2x2 count matrix [[5,2],[1,4]].
    //
    // Expect
    // ------
    // - Reversible and nonreversible estimates agree entrywise within the
    //   convergence tolerance, and the iteration reports convergence.
    fn reversible_matches_nonreversible_on_two_states() {
        // Arrange
        let c = SquareMatrix::dense(array![[5.0, 2.0], [1.0, 4.0]]).unwrap();
        let opts = EstimatorOptions::default();

        // Act
        let rev = transition_matrix(&c, true, None, &opts).unwrap();
        let nonrev = transition_matrix(&c, false, None, &opts).unwrap();

        // Assert
        assert!(rev.converged);
        let tr = rev.transition_matrix.to_dense_array();
        let tn = nonrev.transition_matrix.to_dense_array();
        for (a, b) in tr.iter().zip(tn.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // The reversible free-pi estimate is row-stochastic and satisfies
    // detailed balance with its returned stationary distribution.
    //
    // Given
    // -----
    // - An asymmetric, fully connected 3x3 count matrix and
    //   return_statdist.
    //
    // Expect
    // ------
    // - Rows sum to 1, the detailed-balance defect is at tolerance scale,
    //   pi sums to 1 and satisfies pi T = pi.
    fn reversible_satisfies_detailed_balance() {
        // Arrange
        let c = SquareMatrix::dense(array![
            [10.0, 2.0, 1.0],
            [4.0, 8.0, 3.0],
            [2.0, 5.0, 20.0]
        ])
        .unwrap();
        let opts = EstimatorOptions::new(None, DEFAULT_MAXITER, 1e-12, true, false).unwrap();

        // Act
        let outcome = transition_matrix(&c, true, None, &opts).unwrap();

        // Assert
        assert!(outcome.converged);
        let t = outcome.transition_matrix.to_dense_array();
        let pi = outcome.stationary_distribution.unwrap();
        for row in t.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        assert_relative_eq!(pi.sum(), 1.0, epsilon = 1e-12);
        assert!(detailed_balance_defect(&t, &pi) < 1e-9);
        let pi_t = pi.dot(&t);
        for (a, b) in pi_t.iter().zip(pi.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // Convergence histories are returned exactly when requested, the
    // likelihood ascends, and hitting the iteration cap is reported as a
    // warning, not an error.
    //
    // Given
    // -----
    // - The same 3x3 counts with return_conv and a cap of 2 iterations.
    //
    // Expect
    // ------
    // - Two history entries, converged = false, a NotConverged warning, and
    //   a final likelihood no smaller than the first.
    fn reversible_reports_convergence_diagnostics() {
        // Arrange
        let c = SquareMatrix::dense(array![
            [10.0, 2.0, 1.0],
            [4.0, 8.0, 3.0],
            [2.0, 5.0, 20.0]
        ])
        .unwrap();
        let capped = EstimatorOptions::new(None, 2, 1e-15, false, true).unwrap();

        // Act
        let outcome = transition_matrix(&c, true, None, &capped).unwrap();

        // Assert
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 2);
        let lhist = outcome.likelihood_history.unwrap();
        let pihist = outcome.pi_change_history.unwrap();
        assert_eq!(lhist.len(), 2);
        assert_eq!(pihist.len(), 2);
        assert!(lhist[1] >= lhist[0] - 1e-12, "likelihood must not decrease");
        assert!(matches!(outcome.warnings.as_slice(), [Warning::NotConverged { .. }]));
    }

    #[test]
    // Purpose
    // -------
    // The fixed-pi reversible estimate satisfies detailed balance with the
    // supplied distribution exactly and approaches row-stochasticity.
    //
    // Given
    // -----
    // - A connected 3x3 count matrix and a non-uniform target pi.
    //
    // Expect
    // ------
    // - Zero detailed-balance defect (exact by construction), row sums
    //   within convergence tolerance of 1, converged = true, statdist
    //   echoes mu.
    fn reversible_fixpi_honors_target_distribution() {
        // Arrange
        let c = SquareMatrix::dense(array![
            [3.0, 2.0, 1.0],
            [2.0, 4.0, 2.0],
            [1.0, 1.0, 6.0]
        ])
        .unwrap();
        let mu = array![0.2, 0.3, 0.5];
        let opts = EstimatorOptions::new(None, DEFAULT_MAXITER, 1e-12, true, false).unwrap();

        // Act
        let outcome = transition_matrix(&c, true, Some(&mu), &opts).unwrap();

        // Assert
        assert!(outcome.converged);
        let t = outcome.transition_matrix.to_dense_array();
        assert!(detailed_balance_defect(&t, &mu) < 1e-14);
        for row in t.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-8);
        }
        let echoed = outcome.stationary_distribution.unwrap();
        for (a, b) in echoed.iter().zip(mu.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Reversible paths reject count matrices with empty rows instead of
    // dividing by zero.
    //
    // Given
    // -----
    // - A 2x2 matrix whose second row is zero, for both reversible paths.
    //
    // Expect
    // ------
    // - `ZeroRowSum { row: 1 }`.
    fn reversible_rejects_zero_row_sums() {
        // Arrange
        let c = SquareMatrix::dense(array![[1.0, 1.0], [0.0, 0.0]]).unwrap();
        let mu = array![0.5, 0.5];
        let opts = EstimatorOptions::default();

        // Act / Assert
        assert_eq!(
            transition_matrix(&c, true, None, &opts).unwrap_err(),
            EstimationError::ZeroRowSum { row: 1 }
        );
        assert_eq!(
            transition_matrix(&c, true, Some(&mu), &opts).unwrap_err(),
            EstimationError::ZeroRowSum { row: 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // The unsupported nonreversible fixed-pi combination fails loudly.
    //
    // Given
    // -----
    // - Any valid counts with reversible = false and a supplied mu.
    //
    // Expect
    // ------
    // - `NotImplemented`.
    fn nonreversible_fixed_pi_is_not_implemented() {
        // Arrange
        let c = SquareMatrix::dense(array![[1.0, 1.0], [1.0, 1.0]]).unwrap();
        let mu = array![0.5, 0.5];

        // Act
        let err = transition_matrix(&c, false, Some(&mu), &EstimatorOptions::default())
            .unwrap_err();

        // Assert
        assert!(matches!(err, EstimationError::NotImplemented { .. }));
    }

    #[test]
    // Purpose
    // -------
    // A sparse count matrix produces a sparse reversible estimate (the
    // output representation mirrors the input even for the dense internal
    // computation).
    //
    // Given
    // -----
    // - The 3x3 counts wrapped sparse.
    //
    // Expect
    // ------
    // - Sparse output whose dense view is row-stochastic.
    fn reversible_output_mirrors_sparse_input() {
        // Arrange
        let dense = SquareMatrix::dense(array![
            [10.0, 2.0, 1.0],
            [4.0, 8.0, 3.0],
            [2.0, 5.0, 20.0]
        ])
        .unwrap();
        let c = SquareMatrix::sparse(dense.to_sparse());

        // Act
        let outcome = transition_matrix(&c, true, None, &EstimatorOptions::default()).unwrap();

        // Assert
        assert!(outcome.transition_matrix.is_sparse());
        for row in outcome.transition_matrix.to_dense_array().rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }
    }
}
