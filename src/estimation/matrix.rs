//! estimation::matrix — square numeric matrices, dense or sparse.
//!
//! Purpose
//! -------
//! Provide the one matrix abstraction every estimator entry point dispatches
//! on: [`SquareMatrix`], a tagged union over a dense `ndarray` matrix and a
//! coordinate-format sparse matrix. Entry points branch on the variant once
//! at the boundary and operate uniformly afterwards; results mirror the
//! representation of the input.
//!
//! Key behaviors
//! -------------
//! - Validated construction: both variants are square by construction;
//!   non-square dense input is rejected up front.
//! - Conversions between the two variants always copy. Estimator outputs are
//!   new matrices, never aliases of inputs.
//! - [`CooMatrix`] keeps a canonical triplet list: sorted by `(row, col)`,
//!   duplicates merged, explicit zeros dropped. All sparse algorithms can
//!   therefore iterate triplets in a deterministic order.
//!
//! Invariants & assumptions
//! ------------------------
//! - `CooMatrix` triplets satisfy `row < dim`, `col < dim`, strictly
//!   increasing `(row, col)` order, and `value != 0.0`.
//! - Count matrices are nonnegative, but the types here do not enforce a
//!   sign; estimators that require nonnegativity validate at their boundary.
//!
//! Downstream usage
//! ----------------
//! - `count_matrix` builds sparse matrices from trajectories; `connectivity`
//!   walks the nonzero pattern; `prior` and `transition_matrix` combine and
//!   transform matrices while preserving the caller's representation.

use ndarray::Array2;

use crate::estimation::errors::{EstResult, EstimationError};

/// Square matrix in coordinate (triplet) format.
///
/// Fields
/// ------
/// - `dim`: number of rows (= columns).
/// - `rows`, `cols`, `vals`: parallel triplet arrays in canonical order
///   (sorted by `(row, col)`, duplicates merged, zeros dropped).
///
/// Notes
/// -----
/// - This is a value type: all operations return fresh matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix {
    dim: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
}

impl CooMatrix {
    /// Build a canonical COO matrix from unordered triplets.
    ///
    /// Duplicate coordinates are summed, zero results are dropped, and the
    /// triplets are sorted by `(row, col)`.
    ///
    /// # Errors
    /// - `EstimationError::RowIndexOutOfBounds` if any coordinate is `>= dim`.
    pub fn from_triplets(
        dim: usize, triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> EstResult<Self> {
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();
        for (i, j, v) in triplets {
            if i >= dim {
                return Err(EstimationError::RowIndexOutOfBounds { index: i, dim });
            }
            if j >= dim {
                return Err(EstimationError::RowIndexOutOfBounds { index: j, dim });
            }
            entries.push((i, j, v));
        }
        entries.sort_by_key(|&(i, j, _)| (i, j));

        let mut rows = Vec::with_capacity(entries.len());
        let mut cols = Vec::with_capacity(entries.len());
        let mut vals: Vec<f64> = Vec::with_capacity(entries.len());
        for (i, j, v) in entries {
            if let (Some(&li), Some(&lj)) = (rows.last(), cols.last()) {
                if li == i && lj == j {
                    *vals.last_mut().unwrap() += v;
                    if vals.last() == Some(&0.0) {
                        rows.pop();
                        cols.pop();
                        vals.pop();
                    }
                    continue;
                }
            }
            if v != 0.0 {
                rows.push(i);
                cols.push(j);
                vals.push(v);
            }
        }
        Ok(CooMatrix { dim, rows, cols, vals })
    }

    /// Convert a dense matrix into canonical COO form (copying).
    pub fn from_dense(dense: &Array2<f64>) -> EstResult<Self> {
        let (r, c) = dense.dim();
        if r != c {
            return Err(EstimationError::NonSquareMatrix { rows: r, cols: c });
        }
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut vals = Vec::new();
        for ((i, j), &v) in dense.indexed_iter() {
            if v != 0.0 {
                rows.push(i);
                cols.push(j);
                vals.push(v);
            }
        }
        Ok(CooMatrix { dim: r, rows, cols, vals })
    }

    /// Matrix dimension (rows = columns).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.vals.len()
    }

    /// Iterate triplets `(row, col, value)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .zip(self.vals.iter())
            .map(|((&i, &j), &v)| (i, j, v))
    }

    /// Stored value at `(i, j)`, or 0 for an absent entry.
    ///
    /// Binary search over the canonical triplet order.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let mut lo = 0usize;
        let mut hi = self.rows.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if (self.rows[mid], self.cols[mid]) < (i, j) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo < self.rows.len() && self.rows[lo] == i && self.cols[lo] == j {
            self.vals[lo]
        } else {
            0.0
        }
    }

    /// Materialize as a dense matrix (copying).
    pub fn to_dense(&self) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((self.dim, self.dim));
        for (i, j, v) in self.iter() {
            out[[i, j]] = v;
        }
        out
    }

    /// Transposed copy, back in canonical order.
    pub fn transpose(&self) -> CooMatrix {
        // from_triplets cannot fail here: indices were validated on the way in.
        CooMatrix::from_triplets(self.dim, self.iter().map(|(i, j, v)| (j, i, v)))
            .expect("transposing canonical triplets preserves index bounds")
    }

    /// Row sums as a dense vector.
    pub fn row_sums(&self) -> ndarray::Array1<f64> {
        let mut sums = ndarray::Array1::<f64>::zeros(self.dim);
        for (i, _, v) in self.iter() {
            sums[i] += v;
        }
        sums
    }

    /// Submatrix induced by `states` (ascending, deduplicated by contract).
    ///
    /// Row/column `k` of the result corresponds to `states[k]`; relative
    /// order of the retained states is preserved.
    pub fn select_submatrix(&self, states: &[usize]) -> EstResult<CooMatrix> {
        let mut position = vec![usize::MAX; self.dim];
        for (k, &s) in states.iter().enumerate() {
            if s >= self.dim {
                return Err(EstimationError::RowIndexOutOfBounds { index: s, dim: self.dim });
            }
            position[s] = k;
        }
        let triplets = self.iter().filter_map(|(i, j, v)| {
            let (pi, pj) = (position[i], position[j]);
            (pi != usize::MAX && pj != usize::MAX).then_some((pi, pj, v))
        });
        CooMatrix::from_triplets(states.len(), triplets)
    }
}

/// Square numeric matrix, dense or sparse.
///
/// The single dispatch point for estimator entry points: algorithms match on
/// the variant once and produce results in the same representation.
#[derive(Debug, Clone, PartialEq)]
pub enum SquareMatrix {
    Dense(Array2<f64>),
    Sparse(CooMatrix),
}

impl SquareMatrix {
    /// Wrap a dense matrix, validating squareness.
    pub fn dense(matrix: Array2<f64>) -> EstResult<Self> {
        let (r, c) = matrix.dim();
        if r != c {
            return Err(EstimationError::NonSquareMatrix { rows: r, cols: c });
        }
        Ok(SquareMatrix::Dense(matrix))
    }

    /// Wrap a sparse matrix.
    pub fn sparse(matrix: CooMatrix) -> Self {
        SquareMatrix::Sparse(matrix)
    }

    /// Matrix dimension (rows = columns).
    pub fn dim(&self) -> usize {
        match self {
            SquareMatrix::Dense(m) => m.nrows(),
            SquareMatrix::Sparse(m) => m.dim(),
        }
    }

    /// Whether the underlying representation is sparse.
    pub fn is_sparse(&self) -> bool {
        matches!(self, SquareMatrix::Sparse(_))
    }

    /// Dense copy of the matrix, regardless of representation.
    pub fn to_dense_array(&self) -> Array2<f64> {
        match self {
            SquareMatrix::Dense(m) => m.clone(),
            SquareMatrix::Sparse(m) => m.to_dense(),
        }
    }

    /// Sparse copy of the matrix, regardless of representation.
    pub fn to_sparse(&self) -> CooMatrix {
        match self {
            SquareMatrix::Dense(m) => {
                CooMatrix::from_dense(m).expect("Dense variant is square by construction")
            }
            SquareMatrix::Sparse(m) => m.clone(),
        }
    }

    /// Wrap `dense` in the same representation as `self`.
    pub fn match_representation(&self, dense: Array2<f64>) -> SquareMatrix {
        if self.is_sparse() {
            SquareMatrix::Sparse(
                CooMatrix::from_dense(&dense).expect("estimator outputs are square"),
            )
        } else {
            SquareMatrix::Dense(dense)
        }
    }

    /// Row sums as a dense vector.
    pub fn row_sums(&self) -> ndarray::Array1<f64> {
        match self {
            SquareMatrix::Dense(m) => m.sum_axis(ndarray::Axis(1)),
            SquareMatrix::Sparse(m) => m.row_sums(),
        }
    }

    /// Elementwise sum `self + other`.
    ///
    /// The result is sparse only when both operands are sparse.
    ///
    /// # Errors
    /// - `EstimationError::ShapeMismatch` when dimensions differ.
    pub fn add(&self, other: &SquareMatrix) -> EstResult<SquareMatrix> {
        if self.dim() != other.dim() {
            return Err(EstimationError::ShapeMismatch {
                expected: self.dim(),
                found: other.dim(),
                context: "matrix sum",
            });
        }
        match (self, other) {
            (SquareMatrix::Sparse(a), SquareMatrix::Sparse(b)) => {
                let triplets = a.iter().chain(b.iter());
                Ok(SquareMatrix::Sparse(CooMatrix::from_triplets(a.dim(), triplets)?))
            }
            _ => {
                let mut sum = self.to_dense_array();
                sum += &other.to_dense_array();
                Ok(SquareMatrix::Dense(sum))
            }
        }
    }

    /// Visit every stored nonzero entry as `(row, col, value)`.
    ///
    /// Dense matrices visit entries in row-major order, skipping zeros, so
    /// both representations expose the same deterministic pattern.
    pub fn for_each_nonzero(&self, mut visit: impl FnMut(usize, usize, f64)) {
        match self {
            SquareMatrix::Dense(m) => {
                for ((i, j), &v) in m.indexed_iter() {
                    if v != 0.0 {
                        visit(i, j, v);
                    }
                }
            }
            SquareMatrix::Sparse(m) => {
                for (i, j, v) in m.iter() {
                    visit(i, j, v);
                }
            }
        }
    }
}
