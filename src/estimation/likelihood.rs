//! estimation::likelihood — likelihood evaluation and error propagation.
//!
//! Purpose
//! -------
//! Evaluate the log-likelihood of a count matrix under a transition matrix,
//! and propagate the multinomial counting uncertainty of a count matrix
//! through a sensitivity tensor into the covariance of a derived quantity.
//!
//! Key behaviors
//! -------------
//! - `log_likelihood(C, T) = sum_{ij: T_ij > 0} C_ij ln T_ij`. Only
//!   positive entries of `T` contribute; a valid model has `C_ij = 0`
//!   wherever `T_ij = 0` (an estimator guarantee, not re-checked here).
//! - `tmatrix_cov` builds the Dirichlet covariance of the transition-matrix
//!   rows from posterior counts `alpha_ij = C_ij + 1`:
//!   `cov(T_ij, T_ik) = (delta_jk alpha_ij alpha0_i - alpha_ij alpha_ik) /
//!   (alpha0_i^2 (alpha0_i + 1))` with `alpha0_i = sum_k alpha_ik`. Rows
//!   are independent multinomials, so the covariance is block diagonal over
//!   rows.
//! - `error_perturbation` applies the first-order propagation law
//!   `cov_target = S cov(T) S^T` without materializing the full tensor,
//!   using the rank-one structure of each row block.
//!
//! Conventions
//! -----------
//! - Sensitivities are evaluated at an appropriate estimate of `T`; this
//!   module treats them as plain matrices.
//! - All routines accept dense or sparse count matrices; a dense copy is
//!   taken where the Dirichlet posterior makes the result dense anyway.

use ndarray::{Array2, Array3, Axis};

use crate::estimation::{
    errors::{EstResult, EstimationError},
    matrix::SquareMatrix,
    validation::require_same_dim,
};

/// Log-likelihood of the count matrix `c` given a transition matrix `t`.
///
/// Sums `C_ij ln T_ij` over entries where `T_ij > 0`, for any combination
/// of dense and sparse inputs.
///
/// # Errors
/// - `EstimationError::ShapeMismatch` when the dimensions differ.
pub fn log_likelihood(c: &SquareMatrix, t: &SquareMatrix) -> EstResult<f64> {
    require_same_dim(c.dim(), t.dim(), "log-likelihood")?;
    let mut ll = 0.0;
    match t {
        SquareMatrix::Dense(td) => {
            c.for_each_nonzero(|i, j, cij| {
                let tij = td[[i, j]];
                if tij > 0.0 {
                    ll += cij * tij.ln();
                }
            });
        }
        SquareMatrix::Sparse(ts) => {
            c.for_each_nonzero(|i, j, cij| {
                let tij = ts.get(i, j);
                if tij > 0.0 {
                    ll += cij * tij.ln();
                }
            });
        }
    }
    Ok(ll)
}

/// Dirichlet covariance tensor of the transition-matrix rows.
///
/// Returns the `(n, n, n)` tensor whose slice `i` is the covariance matrix
/// of row `i` of the transition matrix under the multinomial posterior with
/// uniform prior counts (`alpha_ij = C_ij + 1`).
pub fn tmatrix_cov(c: &SquareMatrix) -> Array3<f64> {
    let alpha = posterior_counts(c);
    let n = alpha.nrows();
    let mut cov = Array3::<f64>::zeros((n, n, n));
    for i in 0..n {
        let row = alpha.row(i);
        let alpha0: f64 = row.sum();
        let norm = alpha0 * alpha0 * (alpha0 + 1.0);
        let mut block = cov.index_axis_mut(Axis(0), i);
        for j in 0..n {
            for k in 0..n {
                let mut v = -row[j] * row[k];
                if j == k {
                    v += row[j] * alpha0;
                }
                block[[j, k]] = v / norm;
            }
        }
    }
    cov
}

/// Dirichlet covariance matrix of a single transition-matrix row.
///
/// # Errors
/// - `EstimationError::RowIndexOutOfBounds` when `row >= n`.
pub fn tmatrix_cov_row(c: &SquareMatrix, row: usize) -> EstResult<Array2<f64>> {
    let n = c.dim();
    if row >= n {
        return Err(EstimationError::RowIndexOutOfBounds { index: row, dim: n });
    }
    Ok(tmatrix_cov(c).index_axis(Axis(0), row).to_owned())
}

/// Variance of a scalar quantity with sensitivity matrix `s`.
///
/// First-order propagation of the row-wise Dirichlet covariance:
/// `var = sum_i sum_jk S[i,j] cov_i[j,k] S[i,k]`, computed through the
/// rank-one structure of each row block instead of the explicit tensor.
///
/// # Errors
/// - `EstimationError::ShapeMismatch` when `s` is not `n x n`.
pub fn error_perturbation(c: &SquareMatrix, sensitivity: &Array2<f64>) -> EstResult<f64> {
    let n = c.dim();
    require_same_dim(n, sensitivity.nrows(), "sensitivity rows")?;
    require_same_dim(n, sensitivity.ncols(), "sensitivity columns")?;
    let alpha = posterior_counts(c);
    Ok(row_blocks(&alpha)
        .map(|(i, norm, alpha0)| {
            let (wa, qa) = row_contractions(&alpha, sensitivity, i);
            (wa * alpha0 - qa * qa) / norm
        })
        .sum())
}

/// Covariance of an `m`-dimensional quantity with sensitivity tensor `s`
/// of shape `(m, n, n)`.
///
/// `cov[a][b] = sum_i sum_jk S_a[i,j] cov_i[j,k] S_b[i,k]`.
///
/// # Errors
/// - `EstimationError::ShapeMismatch` when the trailing dimensions of `s`
///   are not `n x n`.
pub fn error_perturbation_tensor(
    c: &SquareMatrix, sensitivities: &Array3<f64>,
) -> EstResult<Array2<f64>> {
    let n = c.dim();
    let (m, rows, cols) = sensitivities.dim();
    require_same_dim(n, rows, "sensitivity rows")?;
    require_same_dim(n, cols, "sensitivity columns")?;
    let alpha = posterior_counts(c);
    let mut cov = Array2::<f64>::zeros((m, m));
    for (i, norm, alpha0) in row_blocks(&alpha) {
        let arow = alpha.row(i);
        // contract each sensitivity slice against row i once
        let weighted_sums: Vec<f64> = (0..m)
            .map(|a| {
                let sa = sensitivities.index_axis(Axis(0), a);
                (0..n).map(|j| sa[[i, j]] * arow[j]).sum()
            })
            .collect();
        for a in 0..m {
            let sa = sensitivities.index_axis(Axis(0), a);
            for b in a..m {
                let sb = sensitivities.index_axis(Axis(0), b);
                let mixed: f64 = (0..n).map(|j| sa[[i, j]] * sb[[i, j]] * arow[j]).sum();
                let v = (mixed * alpha0 - weighted_sums[a] * weighted_sums[b]) / norm;
                cov[[a, b]] += v;
                if a != b {
                    cov[[b, a]] += v;
                }
            }
        }
    }
    Ok(cov)
}

// ---- Helper methods ----

/// Posterior counts `alpha = C + 1` as a dense matrix.
fn posterior_counts(c: &SquareMatrix) -> Array2<f64> {
    let mut alpha = c.to_dense_array();
    alpha += 1.0;
    alpha
}

/// Iterate `(row, normalization, alpha0)` for each Dirichlet row block.
fn row_blocks<'a>(alpha: &'a Array2<f64>) -> impl Iterator<Item = (usize, f64, f64)> + 'a {
    (0..alpha.nrows()).map(move |i| {
        let alpha0: f64 = alpha.row(i).sum();
        (i, alpha0 * alpha0 * (alpha0 + 1.0), alpha0)
    })
}

/// Contractions of one sensitivity row against the posterior counts:
/// `(sum_j s_ij^2 alpha_ij, sum_j s_ij alpha_ij)`.
fn row_contractions(alpha: &Array2<f64>, s: &Array2<f64>, i: usize) -> (f64, f64) {
    let mut weighted_diag = 0.0;
    let mut weighted_sum = 0.0;
    for j in 0..alpha.ncols() {
        let a = alpha[[i, j]];
        weighted_diag += s[[i, j]] * s[[i, j]] * a;
        weighted_sum += s[[i, j]] * a;
    }
    (weighted_diag, weighted_sum)
}
