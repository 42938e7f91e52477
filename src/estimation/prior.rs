//! estimation::prior — pseudo-count matrices for regularized estimation.
//!
//! Purpose
//! -------
//! Build prior count matrices `B` that are added to an observed count
//! matrix `C` before estimation. Each prior encodes a different belief
//! about where probability mass may live: only along observed edges
//! (neighbor), everywhere (constant), or on the reversible parameter
//! subspace (reversible).
//!
//! Key behaviors
//! -------------
//! - `prior_neighbor`: `B[i][j] = alpha` iff `C[i][j] + C[j][i] > 0`, so
//!   uncertainty is added only where the data already suggests an edge.
//!   The result mirrors the input representation.
//! - `prior_const`: `B[i][j] = alpha` for all i, j. The result is dense by
//!   construction; sparse input therefore yields a
//!   [`Warning::SparseDensified`].
//! - `prior_rev`: `B[i][j] = alpha` for `i <= j`, else 0, with the default
//!   `alpha = -1.0` discounting the upper triangle. Dense by construction,
//!   with the same sparsity warning.
//!
//! Conventions
//! -----------
//! - All three functions are pure: `C` is never mutated and the caller
//!   forms `C + B` via [`SquareMatrix::add`].
//! - Results carry their warnings inline as a `(matrix, warnings)` pair;
//!   an empty warning list means the operation was representation-neutral.

use ndarray::Array2;

use crate::diagnostics::Warning;
use crate::estimation::matrix::{CooMatrix, SquareMatrix};

/// Default prior strength for the neighbor and constant priors.
pub const DEFAULT_PRIOR_ALPHA: f64 = 0.001;

/// Default prior strength for the reversible prior.
pub const DEFAULT_PRIOR_REV_ALPHA: f64 = -1.0;

/// Neighbor prior of strength `alpha`.
///
/// `B[i][j] = alpha` wherever `C[i][j] + C[j][i] > 0`, zero elsewhere. The
/// sparsity pattern of `B` is the symmetrized pattern of `C`, so the result
/// keeps the input representation and no warning is emitted.
pub fn prior_neighbor(c: &SquareMatrix, alpha: f64) -> (SquareMatrix, Vec<Warning>) {
    let pattern = symmetric_pattern(c);
    let b = match c {
        SquareMatrix::Dense(_) => {
            let mut dense = Array2::<f64>::zeros((c.dim(), c.dim()));
            for &(i, j) in &pattern {
                dense[[i, j]] = alpha;
            }
            SquareMatrix::Dense(dense)
        }
        SquareMatrix::Sparse(_) => SquareMatrix::Sparse(
            CooMatrix::from_triplets(c.dim(), pattern.into_iter().map(|(i, j)| (i, j, alpha)))
                .expect("pattern indices come from the matrix itself"),
        ),
    };
    (b, Vec::new())
}

/// Constant prior of strength `alpha`.
///
/// `B[i][j] = alpha` for every entry. The result is dense regardless of the
/// input representation; sparse input yields [`Warning::SparseDensified`].
pub fn prior_const(c: &SquareMatrix, alpha: f64) -> (SquareMatrix, Vec<Warning>) {
    let b = SquareMatrix::Dense(Array2::from_elem((c.dim(), c.dim()), alpha));
    let warnings = if c.is_sparse() {
        vec![Warning::SparseDensified { context: "constant prior" }]
    } else {
        Vec::new()
    };
    (b, warnings)
}

/// Reversible prior of strength `alpha` (default `-1.0`).
///
/// `B[i][j] = alpha` for `i <= j`, zero below the diagonal. The asymmetric
/// discount reflects that the degrees of freedom of a reversible transition
/// matrix correspond to one triangle of the matrix. Dense by construction;
/// sparse input yields [`Warning::SparseDensified`].
pub fn prior_rev(c: &SquareMatrix, alpha: f64) -> (SquareMatrix, Vec<Warning>) {
    let n = c.dim();
    let dense = Array2::from_shape_fn((n, n), |(i, j)| if i <= j { alpha } else { 0.0 });
    let warnings = if c.is_sparse() {
        vec![Warning::SparseDensified { context: "reversible prior" }]
    } else {
        Vec::new()
    };
    (SquareMatrix::Dense(dense), warnings)
}

// ---- Helper methods ----

/// Coordinates where `C + C^T` is strictly positive, in deterministic order.
fn symmetric_pattern(c: &SquareMatrix) -> Vec<(usize, usize)> {
    let n = c.dim();
    let mut positive = vec![false; n * n];
    c.for_each_nonzero(|i, j, v| {
        if v > 0.0 {
            positive[i * n + j] = true;
            positive[j * n + i] = true;
        }
    });
    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .filter(|&(i, j)| positive[i * n + j])
        .collect()
}
