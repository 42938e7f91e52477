//! tica::moments — streaming covariance accumulation over chunked data.
//!
//! Purpose
//! -------
//! Accumulate mean, instantaneous covariance, and time-lagged covariance
//! over a stream of data chunks without ever holding the full data in
//! memory, using the pairwise (Chan-style) moment combination
//!
//! ```text
//! w   = w1 + w2,
//! sx  = sx1 + sx2,
//! Mxy = Mxy1 + Mxy2 + (w1 w2 / w) * (m2x - m1x)(m2y - m1y)^T,
//! ```
//!
//! where `m_cx = s_cx / w_c` are the chunk means. Naive accumulation of raw
//! product sums loses precision over long trajectories; combining centered
//! chunk moments keeps the error bounded.
//!
//! Key behaviors
//! -------------
//! - [`Moments`] holds one partial sum (weight, column sums of both sides,
//!   and the product moment) and knows how to absorb another partial.
//! - [`MomentsStorage`] keeps a bounded stack of partials and merges the
//!   tail whenever weights become comparable (binary-counter style) or the
//!   stack exceeds `nsave`, so the total merge error stays at the scale of
//!   `O(log n)` combinations instead of `O(n)`.
//! - [`RunningCovar`] is the user-facing accumulator with an explicit state
//!   machine `{Empty, Accumulating, Finalized}`. `add` ingests one
//!   `(X, Y)` chunk pair strictly sequentially; `finalize` merges all
//!   partials once and yields immutable [`Covariances`].
//! - With `symmetrize`, the instantaneous and lagged moments pool `X` and
//!   `Y` into one sample set of weight `2T` centered at the pooled mean,
//!   and the cross moment accumulates `X0^T Y0 + Y0^T X0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Chunk ingestion order is part of the contract: reordering chunks
//!   changes the floating-point result (not the expectation), so callers
//!   must feed chunks in a deterministic order.
//! - `X` and `Y` of one chunk must have the same number of rows and the
//!   same number of columns; all chunks must share the column dimension of
//!   the first chunk.
//! - Finalization uses the unbiased normalization `M / (w - 1)`; a
//!   single-row stream therefore has an undefined covariance.
//!
//! Concurrency
//! -----------
//! - Strictly sequential: `add` mutates running state and must complete
//!   before the next call. The type is deliberately not shareable across
//!   threads while accumulating.
//!
//! Testing notes
//! -------------
//! - Unit tests verify that chunked accumulation reproduces the direct
//!   single-pass computation for every flag combination, that the partial
//!   stack stays within its bound, and that the state machine rejects
//!   misuse (`add` after `finalize`, finalizing an empty accumulator).

use ndarray::{Array1, Array2, Axis};

use crate::tica::errors::{TicaError, TicaResult};

/// Weight-ratio threshold for tail merging in [`MomentsStorage`].
const MERGE_RTOL: f64 = 1.5;

/// Bounded number of partial sums for a stream of `n_chunks` chunks:
/// `max(ceil(log2(n_chunks)), 2)`.
pub fn nsave_for_chunks(n_chunks: usize) -> usize {
    let log2 = (n_chunks.max(1) as f64).log2().ceil() as usize;
    log2.max(2)
}

/// One partial moment: weight, column sums, and product moment.
///
/// The product moment `mxy` is centered at the partial's own mean when the
/// owning storage is mean-free, and is a raw product sum otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    pub w: f64,
    pub sx: Array1<f64>,
    pub sy: Array1<f64>,
    pub mxy: Array2<f64>,
}

impl Moments {
    /// Absorb another partial into `self`.
    ///
    /// With `mean_free` the product moments are centered, so the cross term
    /// `(w1 w2 / w) * (m2x - m1x)(m2y - m1y)^T` re-centers the combined
    /// moment at the combined mean; without it the product sums are simply
    /// added.
    pub fn combine(&mut self, other: &Moments, mean_free: bool) {
        let w = self.w + other.w;
        if mean_free {
            let dx = &other.sx / other.w - &self.sx / self.w;
            let dy = &other.sy / other.w - &self.sy / self.w;
            self.mxy = &self.mxy + &other.mxy + &(outer(&dx, &dy) * (self.w * other.w / w));
        } else {
            self.mxy = &self.mxy + &other.mxy;
        }
        self.sx = &self.sx + &other.sx;
        self.sy = &self.sy + &other.sy;
        self.w = w;
    }
}

/// Bounded stack of partial moments with tail merging.
///
/// Storing every chunk would make the final combination a left fold over
/// `n` partials; merging the tail whenever the second-to-last weight is
/// within a factor of 1.5 of the last keeps weights growing geometrically
/// toward the bottom of the stack, so at most `O(log n)` partials are alive
/// and each datum participates in `O(log n)` combinations.
#[derive(Debug, Clone)]
pub struct MomentsStorage {
    nsave: usize,
    mean_free: bool,
    storage: Vec<Moments>,
}

impl MomentsStorage {
    /// Create a storage holding at most `max(nsave, 2)` partials.
    pub fn new(nsave: usize, mean_free: bool) -> Self {
        Self { nsave: nsave.max(2), mean_free, storage: Vec::new() }
    }

    /// Store one chunk's moments, merging the tail as needed.
    pub fn store(&mut self, moments: Moments) {
        self.storage.push(moments);
        while self.storage.len() >= 2 {
            let len = self.storage.len();
            let comparable = self.storage[len - 2].w <= self.storage[len - 1].w * MERGE_RTOL;
            if !comparable && len <= self.nsave {
                break;
            }
            let top = self.storage.pop().expect("len >= 2");
            self.storage
                .last_mut()
                .expect("len >= 2")
                .combine(&top, self.mean_free);
        }
    }

    /// Number of partials currently alive.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the storage has seen no data.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Combine all partials into one total moment (left to right).
    pub fn total(&self) -> Option<Moments> {
        let mut iter = self.storage.iter();
        let mut acc = iter.next()?.clone();
        for m in iter {
            acc.combine(m, self.mean_free);
        }
        Some(acc)
    }
}

/// Lifecycle of a [`RunningCovar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Empty,
    Accumulating,
    Finalized,
}

impl AccumulatorState {
    fn name(self) -> &'static str {
        match self {
            AccumulatorState::Empty => "empty",
            AccumulatorState::Accumulating => "accumulating",
            AccumulatorState::Finalized => "finalized",
        }
    }
}

/// Immutable result of a finalized accumulation.
///
/// - `weight`: total accumulated weight (`2T` totals when symmetrized).
/// - `mean_x` / `mean_y`: column means of the two sides (equal when
///   symmetrized).
/// - `cov_xx` / `cov_xy` / `cov_yy`: requested covariance blocks with the
///   unbiased `w - 1` normalization; unrequested blocks are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariances {
    pub weight: f64,
    pub mean_x: Array1<f64>,
    pub mean_y: Array1<f64>,
    pub cov_xx: Option<Array2<f64>>,
    pub cov_xy: Option<Array2<f64>>,
    pub cov_yy: Option<Array2<f64>>,
}

/// Streaming accumulator for instantaneous and time-lagged covariances.
///
/// Configure which blocks to compute (`xx`, `xy`, `yy`), whether moments
/// are mean-centered, and whether the estimate is symmetrized; then feed
/// `(X, Y)` chunk pairs in order and finalize once.
#[derive(Debug, Clone)]
pub struct RunningCovar {
    compute_xx: bool,
    compute_xy: bool,
    compute_yy: bool,
    remove_mean: bool,
    symmetrize: bool,
    state: AccumulatorState,
    dim: usize,
    storage_xx: MomentsStorage,
    storage_xy: MomentsStorage,
    storage_yy: MomentsStorage,
}

impl RunningCovar {
    /// Create an accumulator.
    ///
    /// Parameters
    /// ----------
    /// - `xx`, `xy`, `yy`: which covariance blocks to accumulate. At least
    ///   one must be requested.
    /// - `remove_mean`: center chunk moments (mean-free covariances).
    /// - `symmetrize`: pool `X` and `Y` for a time-symmetric estimate.
    /// - `nsave`: partial-moment bound, see [`nsave_for_chunks`].
    ///
    /// # Errors
    /// - `TicaError::StateError` when no block is requested (the would-be
    ///   accumulator has nothing to do).
    pub fn new(
        xx: bool, xy: bool, yy: bool, remove_mean: bool, symmetrize: bool, nsave: usize,
    ) -> TicaResult<Self> {
        if !(xx || xy || yy) {
            return Err(TicaError::StateError {
                operation: "construct",
                state: "no covariance block requested",
            });
        }
        Ok(Self {
            compute_xx: xx,
            compute_xy: xy,
            compute_yy: yy,
            remove_mean,
            symmetrize,
            state: AccumulatorState::Empty,
            dim: 0,
            storage_xx: MomentsStorage::new(nsave, remove_mean),
            storage_xy: MomentsStorage::new(nsave, remove_mean),
            storage_yy: MomentsStorage::new(nsave, remove_mean),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Largest number of partial moments alive in any storage.
    pub fn stored_partials(&self) -> usize {
        self.storage_xx.len().max(self.storage_xy.len()).max(self.storage_yy.len())
    }

    /// Ingest one `(X, Y)` chunk pair.
    ///
    /// Rows are paired observations `(x_t, y_t)`; for a time-lagged stream
    /// `y_t = x_{t + lag}`. Empty chunks are ignored.
    ///
    /// # Errors
    /// - `TicaError::StateError` after finalization.
    /// - `TicaError::ShapeMismatch` when `X` and `Y` disagree in shape or a
    ///   chunk's column count differs from the first chunk.
    pub fn add(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> TicaResult<()> {
        if self.state == AccumulatorState::Finalized {
            return Err(TicaError::StateError { operation: "add", state: self.state.name() });
        }
        if x.nrows() != y.nrows() {
            return Err(TicaError::ShapeMismatch {
                expected: x.nrows(),
                found: y.nrows(),
                context: "chunk rows",
            });
        }
        if x.ncols() != y.ncols() {
            return Err(TicaError::ShapeMismatch {
                expected: x.ncols(),
                found: y.ncols(),
                context: "chunk columns",
            });
        }
        if x.nrows() == 0 {
            return Ok(());
        }
        if self.state == AccumulatorState::Empty {
            self.dim = x.ncols();
            self.state = AccumulatorState::Accumulating;
        } else if x.ncols() != self.dim {
            return Err(TicaError::ShapeMismatch {
                expected: self.dim,
                found: x.ncols(),
                context: "chunk dimension",
            });
        }

        if self.symmetrize {
            self.add_symmetric(x, y);
        } else {
            self.add_plain(x, y);
        }
        Ok(())
    }

    /// Merge all partials and freeze the accumulator.
    ///
    /// # Errors
    /// - `TicaError::EmptyAccumulator` when no data was added.
    /// - `TicaError::StateError` on repeated finalization.
    pub fn finalize(&mut self) -> TicaResult<Covariances> {
        match self.state {
            AccumulatorState::Empty => return Err(TicaError::EmptyAccumulator),
            AccumulatorState::Finalized => {
                return Err(TicaError::StateError {
                    operation: "finalize",
                    state: self.state.name(),
                });
            }
            AccumulatorState::Accumulating => {}
        }
        self.state = AccumulatorState::Finalized;

        let xx = self.storage_xx.total();
        let xy = self.storage_xy.total();
        let yy = self.storage_yy.total();
        let reference = xx
            .as_ref()
            .or(xy.as_ref())
            .or(yy.as_ref())
            .expect("accumulating state implies stored moments");
        let weight = reference.w;
        let mean_x = &reference.sx / weight;
        let mean_y = &reference.sy / weight;

        let normalize = |m: Option<Moments>| m.map(|m| m.mxy / (m.w - 1.0));
        Ok(Covariances {
            weight,
            mean_x,
            mean_y,
            cov_xx: normalize(xx),
            cov_xy: normalize(xy),
            cov_yy: normalize(yy),
        })
    }

    // ---- Helper methods ----

    /// Accumulate plain (asymmetric) chunk moments.
    fn add_plain(&mut self, x: &Array2<f64>, y: &Array2<f64>) {
        let w = x.nrows() as f64;
        let sx = x.sum_axis(Axis(0));
        let sy = y.sum_axis(Axis(0));
        let (x0, y0) = if self.remove_mean {
            (x - &(&sx / w), y - &(&sy / w))
        } else {
            (x.clone(), y.clone())
        };
        if self.compute_xx {
            self.storage_xx.store(Moments {
                w,
                sx: sx.clone(),
                sy: sx.clone(),
                mxy: x0.t().dot(&x0),
            });
        }
        if self.compute_xy {
            self.storage_xy.store(Moments {
                w,
                sx: sx.clone(),
                sy: sy.clone(),
                mxy: x0.t().dot(&y0),
            });
        }
        if self.compute_yy {
            self.storage_yy.store(Moments { w, sx: sy.clone(), sy, mxy: y0.t().dot(&y0) });
        }
    }

    /// Accumulate time-symmetric chunk moments: `X` and `Y` pool into one
    /// sample set of weight `2T` centered at the pooled mean.
    fn add_symmetric(&mut self, x: &Array2<f64>, y: &Array2<f64>) {
        let w = 2.0 * x.nrows() as f64;
        let s = x.sum_axis(Axis(0)) + y.sum_axis(Axis(0));
        let (x0, y0) = if self.remove_mean {
            let mean = &s / w;
            (x - &mean, y - &mean)
        } else {
            (x.clone(), y.clone())
        };
        if self.compute_xx || self.compute_yy {
            let mxx = x0.t().dot(&x0) + y0.t().dot(&y0);
            let moments = Moments { w, sx: s.clone(), sy: s.clone(), mxy: mxx };
            if self.compute_xx {
                self.storage_xx.store(moments.clone());
            }
            if self.compute_yy {
                self.storage_yy.store(moments);
            }
        }
        if self.compute_xy {
            let mxy = x0.t().dot(&y0) + y0.t().dot(&x0);
            self.storage_xy.store(Moments { w, sx: s.clone(), sy: s, mxy });
        }
    }
}

// ---- Helper methods ----

/// Outer product `a b^T`.
fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
