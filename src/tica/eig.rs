//! tica::eig — regularized generalized symmetric eigensolver.
//!
//! Purpose
//! -------
//! Solve the generalized eigenvalue problem `Ct r = lambda C0 r` for a
//! symmetric positive semi-definite `C0` and symmetric `Ct`, discarding the
//! eigendirections of `C0` whose normalized eigenvalue falls below a cutoff
//! `epsilon`. Rank truncation keeps the whitening transform
//! well-conditioned when `C0` is (numerically) rank-deficient, which is the
//! normal situation for correlated input features.
//!
//! Key behaviors
//! -------------
//! - Both inputs are symmetrized (`(M + M^T) / 2`) before decomposition so
//!   that accumulated floating-point asymmetry cannot leak into complex
//!   arithmetic.
//! - `C0 = V diag(s) V^T`; directions with `s_i / max(s) <= epsilon` are
//!   dropped; the survivors define the whitening `L = V_r diag(1/sqrt(s_r))`.
//! - The projected matrix `L^T Ct L` is symmetrized and decomposed again;
//!   its eigenpairs are sorted by descending eigenvalue magnitude and
//!   back-transformed to generalized eigenvectors `U = L R`.
//!
//! Conventions
//! -----------
//! - `ndarray` is the ambient matrix type; `nalgebra` performs the
//!   symmetric eigendecompositions. The copy bridge between the two lives
//!   in this module and never aliases.
//! - Returned eigenvectors are columns of `U`, matching eigenvalue order.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::tica::errors::{TicaError, TicaResult};

/// Solve `ct r = lambda c0 r` with rank truncation at `epsilon`.
///
/// Parameters
/// ----------
/// - `c0`: symmetric positive semi-definite instantaneous covariance.
/// - `ct`: symmetric time-lagged covariance of the same dimension.
/// - `epsilon`: relative eigenvalue cutoff; directions of `c0` with
///   `s_i / max(s) <= epsilon` (or `s_i <= 0`) are discarded.
///
/// Returns
/// -------
/// `TicaResult<(Array1<f64>, Array2<f64>)>`
///   Eigenvalues sorted by descending magnitude and the matching
///   generalized eigenvectors as columns of an `n x r` matrix, where `r`
///   is the retained rank.
///
/// Errors
/// ------
/// - `TicaError::ShapeMismatch` when `c0`/`ct` are not square matrices of
///   the same dimension.
/// - `TicaError::RankDeficient` when no eigendirection survives the
///   cutoff.
pub fn eig_corr(
    c0: &Array2<f64>, ct: &Array2<f64>, epsilon: f64,
) -> TicaResult<(Array1<f64>, Array2<f64>)> {
    let n = c0.nrows();
    if c0.ncols() != n {
        return Err(TicaError::ShapeMismatch {
            expected: n,
            found: c0.ncols(),
            context: "instantaneous covariance",
        });
    }
    if ct.nrows() != n || ct.ncols() != n {
        return Err(TicaError::ShapeMismatch {
            expected: n,
            found: ct.nrows(),
            context: "lagged covariance",
        });
    }

    if n == 0 {
        return Err(TicaError::RankDeficient { epsilon });
    }

    // decompose the symmetrized instantaneous covariance
    let eig0 = to_dmatrix(&symmetrized(c0)).symmetric_eigen();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eig0.eigenvalues[b]
            .partial_cmp(&eig0.eigenvalues[a])
            .expect("symmetric eigenvalues are finite")
    });

    let s_max = eig0.eigenvalues[order[0]];
    let retained: Vec<usize> = order
        .into_iter()
        .filter(|&i| {
            let s = eig0.eigenvalues[i];
            s > 0.0 && s / s_max > epsilon
        })
        .collect();
    if retained.is_empty() {
        return Err(TicaError::RankDeficient { epsilon });
    }

    // whitening transform onto the retained subspace
    let rank = retained.len();
    let mut whitening = DMatrix::<f64>::zeros(n, rank);
    for (col, &i) in retained.iter().enumerate() {
        let scale = 1.0 / eig0.eigenvalues[i].sqrt();
        for row in 0..n {
            whitening[(row, col)] = eig0.eigenvectors[(row, i)] * scale;
        }
    }

    // projected lagged covariance, symmetrized against round-off
    let ct_nalg = to_dmatrix(&symmetrized(ct));
    let projected = whitening.transpose() * &ct_nalg * &whitening;
    let projected_sym = (&projected + &projected.transpose()) * 0.5;
    let eig_t = projected_sym.symmetric_eigen();

    let mut t_order: Vec<usize> = (0..rank).collect();
    t_order.sort_by(|&a, &b| {
        eig_t.eigenvalues[b]
            .abs()
            .partial_cmp(&eig_t.eigenvalues[a].abs())
            .expect("symmetric eigenvalues are finite")
    });

    let mut eigenvalues = Array1::<f64>::zeros(rank);
    let mut eigenvectors = Array2::<f64>::zeros((n, rank));
    for (col, &i) in t_order.iter().enumerate() {
        eigenvalues[col] = eig_t.eigenvalues[i];
        // back-transform: U[:, col] = L * R[:, i]
        for row in 0..n {
            let mut v = 0.0;
            for k in 0..rank {
                v += whitening[(row, k)] * eig_t.eigenvectors[(k, i)];
            }
            eigenvectors[[row, col]] = v;
        }
    }
    Ok((eigenvalues, eigenvectors))
}

// ---- Helper methods ----

/// Symmetrized copy `(m + m^T) / 2`.
fn symmetrized(m: &Array2<f64>) -> Array2<f64> {
    (m + &m.t()) * 0.5
}

/// Copy an `ndarray` matrix into a `nalgebra::DMatrix` (column-major
/// writes; values untouched).
fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for ((i, j), &v) in m.indexed_iter() {
        out[(i, j)] = v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Exactness on diagonal problems, the generalized eigenrelation on a
    // generic symmetric pair, rank truncation of a degenerate direction,
    // ordering by eigenvalue magnitude, and the failure modes.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    #[test]
    // Purpose
    // -------
    // With C0 = I the problem reduces to an ordinary symmetric
    // eigenproblem; eigenvalues must match the diagonal entries sorted by
    // magnitude.
    //
    // Given
    // -----
    // - C0 = I3 and Ct = diag(0.9, -0.5, 0.1).
    //
    // Expect
    // ------
    // - Eigenvalues [0.9, -0.5, 0.1] in magnitude order.
    fn identity_c0_reduces_to_plain_eigenproblem() {
        // Arrange
        let c0 = Array2::<f64>::eye(3);
        let ct = Array2::from_diag(&array![0.9, -0.5, 0.1]);

        // Act
        let (values, vectors) = eig_corr(&c0, &ct, 1e-10).unwrap();

        // Assert
        assert_eq!(vectors.dim(), (3, 3));
        assert_relative_eq!(values[0], 0.9, epsilon = TOL);
        assert_relative_eq!(values[1], -0.5, epsilon = TOL);
        assert_relative_eq!(values[2], 0.1, epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // Returned pairs satisfy the generalized eigenrelation
    // Ct u = lambda C0 u on a generic well-conditioned pair.
    //
    // Given
    // -----
    // - A positive definite C0 and a symmetric Ct, both 3x3.
    //
    // Expect
    // ------
    // - ||Ct u - lambda C0 u|| at tolerance scale for every pair, and
    //   eigenvalues in descending magnitude order.
    fn pairs_satisfy_generalized_relation() {
        // Arrange
        let c0 = array![[2.0, 0.3, 0.1], [0.3, 1.5, 0.2], [0.1, 0.2, 1.0]];
        let ct = array![[0.8, 0.2, 0.0], [0.2, 0.5, 0.1], [0.0, 0.1, -0.3]];

        // Act
        let (values, vectors) = eig_corr(&c0, &ct, 1e-12).unwrap();

        // Assert
        for col in 0..values.len() {
            let u = vectors.column(col).to_owned();
            let lhs = ct.dot(&u);
            let rhs = c0.dot(&u) * values[col];
            for (a, b) in lhs.iter().zip(rhs.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
        for w in values.windows(2) {
            assert!(w[0].abs() >= w[1].abs() - TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // A numerically degenerate direction of C0 is truncated, shrinking the
    // output rank instead of poisoning the whitening.
    //
    // Given
    // -----
    // - C0 = diag(1, 1, 1e-14) with epsilon = 1e-6 and a full-rank Ct.
    //
    // Expect
    // ------
    // - Rank 2 output; eigenvectors have 3 rows and 2 columns.
    fn degenerate_direction_is_truncated() {
        // Arrange
        let c0 = Array2::from_diag(&array![1.0, 1.0, 1e-14]);
        let ct = Array2::from_diag(&array![0.5, 0.2, 0.1]);

        // Act
        let (values, vectors) = eig_corr(&c0, &ct, 1e-6).unwrap();

        // Assert
        assert_eq!(values.len(), 2);
        assert_eq!(vectors.dim(), (3, 2));
        assert_relative_eq!(values[0], 0.5, epsilon = TOL);
        assert_relative_eq!(values[1], 0.2, epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // A covariance with no admissible direction is an error, as is a shape
    // mismatch between the two inputs.
    //
    // Given
    // -----
    // - C0 = 0 (nothing survives any cutoff) and mismatched shapes.
    //
    // Expect
    // ------
    // - RankDeficient and ShapeMismatch respectively.
    fn failure_modes() {
        // Arrange
        let zero = Array2::<f64>::zeros((2, 2));
        let ct = Array2::<f64>::eye(2);
        let ct3 = Array2::<f64>::eye(3);

        // Act / Assert
        assert!(matches!(
            eig_corr(&zero, &ct, 1e-6).unwrap_err(),
            TicaError::RankDeficient { .. }
        ));
        assert!(matches!(
            eig_corr(&ct, &ct3, 1e-6).unwrap_err(),
            TicaError::ShapeMismatch { .. }
        ));
    }
}
