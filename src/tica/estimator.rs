//! tica::estimator — time-lagged independent component analysis.
//!
//! Purpose
//! -------
//! Orchestrate the full TICA estimation: stream time-lagged chunk pairs of
//! the input trajectories into the covariance accumulator, solve the
//! regularized generalized eigenproblem `Ct r = lambda C0 r`, and expose
//! the resulting projection as an immutable [`TicaModel`].
//!
//! Key behaviors
//! -------------
//! - [`TicaOptions`] validates its configuration at construction: the lag
//!   must be positive, an explicit output dimension and a variance cutoff
//!   are mutually exclusive, and the numeric knobs must be admissible.
//! - [`Tica::estimate`] applies the stride by frame subsampling (the lag
//!   counts strided frames), skips trajectories whose strided length does
//!   not exceed the lag (recording their indices), and fails only when no
//!   trajectory survives.
//! - Covariances are estimated mean-free and time-symmetric; the number of
//!   retained partial moments scales logarithmically with the precomputed
//!   chunk count.
//! - Eigenvalues are sorted by descending magnitude; the cumulative
//!   kinetic variance `cumvar = cumsum(lambda^2) / sum(lambda^2)` resolves
//!   the output dimension under a variance cutoff.
//! - [`TicaModel::transform`] projects mean-free data onto the leading
//!   eigenvectors, optionally rescaling by eigenvalues (kinetic map) so
//!   that Euclidean distances in the projection approximate kinetic
//!   distances.
//!
//! Invariants & assumptions
//! ------------------------
//! - The model is created once per estimation call and is read-only
//!   afterwards; re-estimation builds a new model.
//! - Chunk iteration order is deterministic (trajectory order, then chunk
//!   order within each trajectory); re-running on identical input yields
//!   identical results up to floating arithmetic.
//!
//! Conventions
//! -----------
//! - Rows index time, columns index input features.
//! - Eigenvectors are columns, matching eigenvalue order.
//!
//! Testing notes
//! -------------
//! - Unit tests cover configuration validation, recovery of a slow linear
//!   coordinate from a deterministic mixed signal, dimension resolution
//!   via both knobs, kinetic-map scaling, skipped-trajectory accounting,
//!   and estimation idempotence. The integration suite exercises the full
//!   pipeline against chunked and strided variants.

use ndarray::{s, Array1, Array2, Axis};

use crate::diagnostics::Warning;
use crate::tica::{
    eig::eig_corr,
    errors::{TicaError, TicaResult},
    moments::{nsave_for_chunks, RunningCovar},
};

/// Default cumulative kinetic variance cutoff.
pub const DEFAULT_VAR_CUTOFF: f64 = 0.95;

/// Default relative eigenvalue cutoff for rank truncation.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Default number of time-lagged pairs per accumulator chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Validated TICA configuration.
///
/// Fields
/// ------
/// - `lag`: lag time in (strided) trajectory steps, `>= 1`.
/// - `dim`: optional explicit output dimension; exclusive with a
///   non-default `var_cutoff`.
/// - `var_cutoff`: cumulative kinetic variance cutoff in (0, 1]; `1.0`
///   keeps every numerically available dimension.
/// - `kinetic_map`: scale projections by eigenvalues.
/// - `epsilon`: rank-truncation cutoff for the instantaneous covariance.
/// - `mean`: optional precomputed mean overriding the estimated one in the
///   transform.
/// - `stride`: frame subsampling factor applied before lagging.
/// - `chunk_size`: number of lagged pairs fed to the accumulator per
///   chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TicaOptions {
    pub lag: usize,
    pub dim: Option<usize>,
    pub var_cutoff: f64,
    pub kinetic_map: bool,
    pub epsilon: f64,
    pub mean: Option<Array1<f64>>,
    pub stride: usize,
    pub chunk_size: usize,
}

impl TicaOptions {
    /// Construct a validated configuration.
    ///
    /// Setting `dim` selects a fixed output dimension and forces the
    /// variance cutoff to `1.0`; setting `var_cutoff` selects a
    /// variance-resolved dimension. Setting both is an error; setting
    /// neither uses [`DEFAULT_VAR_CUTOFF`].
    ///
    /// # Errors
    /// - `TicaError::InvalidLag` when `lag == 0`.
    /// - `TicaError::MutuallyExclusiveDim` when both `dim` and
    ///   `var_cutoff` are set.
    /// - `TicaError::InvalidDim` when `dim == Some(0)`.
    /// - `TicaError::InvalidVarCutoff` when the cutoff is outside (0, 1].
    /// - `TicaError::InvalidEpsilon`, `InvalidStride`, `InvalidChunkSize`
    ///   for the remaining knobs.
    pub fn new(
        lag: usize, dim: Option<usize>, var_cutoff: Option<f64>, kinetic_map: bool, epsilon: f64,
        mean: Option<Array1<f64>>, stride: usize, chunk_size: usize,
    ) -> TicaResult<Self> {
        if lag == 0 {
            return Err(TicaError::InvalidLag { lag });
        }
        if let (Some(d), Some(v)) = (dim, var_cutoff) {
            return Err(TicaError::MutuallyExclusiveDim { dim: d, var_cutoff: v });
        }
        if dim == Some(0) {
            return Err(TicaError::InvalidDim { dim: 0 });
        }
        let var_cutoff = match (dim, var_cutoff) {
            (Some(_), None) => 1.0,
            (None, Some(v)) => {
                if !v.is_finite() || v <= 0.0 || v > 1.0 {
                    return Err(TicaError::InvalidVarCutoff { var_cutoff: v });
                }
                v
            }
            (None, None) => DEFAULT_VAR_CUTOFF,
            (Some(_), Some(_)) => unreachable!("rejected above"),
        };
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(TicaError::InvalidEpsilon { epsilon });
        }
        if stride == 0 {
            return Err(TicaError::InvalidStride { stride });
        }
        if chunk_size == 0 {
            return Err(TicaError::InvalidChunkSize { chunk_size });
        }
        Ok(Self { lag, dim, var_cutoff, kinetic_map, epsilon, mean, stride, chunk_size })
    }

    /// Configuration with every knob at its default for the given lag:
    /// variance-resolved dimension at [`DEFAULT_VAR_CUTOFF`], kinetic map
    /// on, [`DEFAULT_EPSILON`], no precomputed mean, stride 1.
    pub fn with_lag(lag: usize) -> TicaResult<Self> {
        TicaOptions::new(lag, None, None, true, DEFAULT_EPSILON, None, 1, DEFAULT_CHUNK_SIZE)
    }
}

/// TICA estimator: holds a validated configuration and builds models.
#[derive(Debug, Clone)]
pub struct Tica {
    opts: TicaOptions,
}

impl Tica {
    pub fn new(opts: TicaOptions) -> Self {
        Self { opts }
    }

    /// Estimate a [`TicaModel`] from a set of feature trajectories.
    ///
    /// Parameters
    /// ----------
    /// - `trajs`: one matrix per trajectory, rows = frames, columns =
    ///   features. All trajectories must share the feature dimension.
    ///
    /// Returns
    /// -------
    /// `TicaResult<TicaModel>`
    ///   The immutable model holding means, covariances, eigenpairs,
    ///   cumulative variances, and diagnostics.
    ///
    /// Errors
    /// ------
    /// - `TicaError::DegenerateData` when no trajectory has more strided
    ///   frames than the lag (shorter trajectories are skipped and
    ///   surfaced through the model's diagnostics instead).
    /// - `TicaError::ShapeMismatch` on inconsistent feature dimensions.
    /// - `TicaError::InvalidMeanLength` when a precomputed mean does not
    ///   match the feature dimension.
    /// - `TicaError::DimensionTooLarge` when an explicit `dim` exceeds the
    ///   feature dimension.
    /// - `TicaError::RankDeficient` when the instantaneous covariance has
    ///   no direction above `epsilon`.
    pub fn estimate(&self, trajs: &[Array2<f64>]) -> TicaResult<TicaModel> {
        let opts = &self.opts;
        let input_dim = trajs.first().map(|t| t.ncols()).unwrap_or(0);
        if input_dim == 0 {
            return Err(TicaError::DegenerateData { lag: opts.lag, longest: 0 });
        }
        for t in trajs {
            if t.ncols() != input_dim {
                return Err(TicaError::ShapeMismatch {
                    expected: input_dim,
                    found: t.ncols(),
                    context: "trajectory dimension",
                });
            }
        }
        if let Some(d) = opts.dim {
            if d > input_dim {
                return Err(TicaError::DimensionTooLarge { dim: d, input_dim });
            }
        }
        if let Some(mean) = &opts.mean {
            if mean.len() != input_dim {
                return Err(TicaError::InvalidMeanLength {
                    expected: input_dim,
                    found: mean.len(),
                });
            }
        }

        // stride first; the lag counts strided frames
        let strided: Vec<Array2<f64>> = trajs.iter().map(|t| subsample(t, opts.stride)).collect();
        let mut skipped: Vec<usize> = Vec::new();
        let mut eligible: Vec<&Array2<f64>> = Vec::new();
        for (i, t) in strided.iter().enumerate() {
            if t.nrows() > opts.lag {
                eligible.push(t);
            } else {
                skipped.push(i);
            }
        }
        if eligible.is_empty() {
            let longest = strided.iter().map(|t| t.nrows()).max().unwrap_or(0);
            return Err(TicaError::DegenerateData { lag: opts.lag, longest });
        }

        let n_chunks: usize = eligible
            .iter()
            .map(|t| (t.nrows() - opts.lag).div_ceil(opts.chunk_size))
            .sum();
        let mut covar =
            RunningCovar::new(true, true, false, true, true, nsave_for_chunks(n_chunks))?;
        for t in &eligible {
            let pairs = t.nrows() - opts.lag;
            let mut lo = 0usize;
            while lo < pairs {
                let hi = (lo + opts.chunk_size).min(pairs);
                let x = t.slice(s![lo..hi, ..]).to_owned();
                let y = t.slice(s![lo + opts.lag..hi + opts.lag, ..]).to_owned();
                covar.add(&x, &y)?;
                lo = hi;
            }
        }
        let covariances = covar.finalize()?;
        let cov = covariances.cov_xx.expect("xx block was requested");
        let cov_tau = covariances.cov_xy.expect("xy block was requested");

        let (eigenvalues, eigenvectors) = eig_corr(&cov, &cov_tau, opts.epsilon)?;

        let mut cumvar = Array1::<f64>::zeros(eigenvalues.len());
        let mut acc = 0.0;
        for (i, &l) in eigenvalues.iter().enumerate() {
            acc += l * l;
            cumvar[i] = acc;
        }
        if acc > 0.0 {
            cumvar /= acc;
        }

        let mut warnings = Vec::new();
        if !skipped.is_empty() {
            warnings.push(Warning::SkippedTrajectories { indices: skipped.clone() });
        }

        let mean = opts.mean.clone().unwrap_or_else(|| covariances.mean_x.clone());
        Ok(TicaModel {
            lag: opts.lag,
            dim: opts.dim,
            var_cutoff: opts.var_cutoff,
            kinetic_map: opts.kinetic_map,
            mean,
            cov,
            cov_tau,
            eigenvalues,
            eigenvectors,
            cumvar,
            skipped_trajs: skipped,
            warnings,
        })
    }
}

/// Immutable TICA model: estimation result plus the projection transform.
///
/// Created once by [`Tica::estimate`] and read-only afterwards; all
/// accessors borrow.
#[derive(Debug, Clone, PartialEq)]
pub struct TicaModel {
    lag: usize,
    dim: Option<usize>,
    var_cutoff: f64,
    kinetic_map: bool,
    mean: Array1<f64>,
    cov: Array2<f64>,
    cov_tau: Array2<f64>,
    eigenvalues: Array1<f64>,
    eigenvectors: Array2<f64>,
    cumvar: Array1<f64>,
    skipped_trajs: Vec<usize>,
    warnings: Vec<Warning>,
}

impl TicaModel {
    /// Lag time the model was estimated at.
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Mean of the input features (estimated or precomputed).
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Mean-free instantaneous covariance `C0`.
    pub fn cov(&self) -> &Array2<f64> {
        &self.cov
    }

    /// Mean-free time-lagged covariance `C_tau`.
    pub fn cov_tau(&self) -> &Array2<f64> {
        &self.cov_tau
    }

    /// Eigenvalues, sorted by descending magnitude.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Generalized eigenvectors as columns, matching eigenvalue order.
    pub fn eigenvectors(&self) -> &Array2<f64> {
        &self.eigenvectors
    }

    /// Cumulative normalized kinetic variance `cumsum(l^2) / sum(l^2)`.
    pub fn cumvar(&self) -> &Array1<f64> {
        &self.cumvar
    }

    /// Indices of trajectories skipped for being shorter than the lag.
    pub fn skipped_trajectories(&self) -> &[usize] {
        &self.skipped_trajs
    }

    /// Diagnostics accumulated during estimation.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Resolved output dimension.
    ///
    /// An explicit `dim` is capped by the retained rank; otherwise the
    /// smallest dimension whose cumulative kinetic variance reaches the
    /// cutoff is used (`var_cutoff = 1.0` keeps the full rank).
    pub fn dimension(&self) -> usize {
        let rank = self.eigenvalues.len();
        match self.dim {
            Some(d) => d.min(rank),
            None => {
                if self.var_cutoff >= 1.0 {
                    rank
                } else {
                    self.cumvar
                        .iter()
                        .position(|&v| v >= self.var_cutoff)
                        .map(|i| i + 1)
                        .unwrap_or(rank)
                        .min(rank)
                }
            }
        }
    }

    /// Project data onto the dominant independent components.
    ///
    /// Computes `(X - mean) * U[:, 0..d]` with `d = self.dimension()`;
    /// with kinetic-map scaling each projected column is additionally
    /// multiplied by its eigenvalue.
    ///
    /// # Errors
    /// - `TicaError::ShapeMismatch` when the column count of `x` differs
    ///   from the model's input dimension.
    pub fn transform(&self, x: &Array2<f64>) -> TicaResult<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(TicaError::ShapeMismatch {
                expected: self.mean.len(),
                found: x.ncols(),
                context: "transform input",
            });
        }
        let d = self.dimension();
        let mean_free = x - &self.mean;
        let mut projected = mean_free.dot(&self.eigenvectors.slice(s![.., ..d]));
        if self.kinetic_map {
            for (mut col, &l) in
                projected.columns_mut().into_iter().zip(self.eigenvalues.slice(s![..d]).iter())
            {
                col *= l;
            }
        }
        Ok(projected)
    }

    /// Implied timescales `-lag / ln |lambda_i|`.
    ///
    /// Eigenvalues of magnitude 1 or above map to infinity, zero
    /// eigenvalues to 0.
    pub fn timescales(&self) -> Array1<f64> {
        let lag = self.lag as f64;
        self.eigenvalues.mapv(|l| -lag / l.abs().ln())
    }
}

// ---- Helper methods ----

/// Every `stride`-th row of a trajectory, starting at the first frame.
fn subsample(traj: &Array2<f64>, stride: usize) -> Array2<f64> {
    if stride == 1 {
        return traj.clone();
    }
    let indices: Vec<usize> = (0..traj.nrows()).step_by(stride).collect();
    traj.select(Axis(0), &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Configuration validation, recovery of a slow mixed coordinate,
    // dimension resolution through both knobs, kinetic-map scaling,
    // stride/skip bookkeeping, idempotence, and the fatal degenerate case.
    // -------------------------------------------------------------------------

    /// Two deterministic oscillations (slow and fast) linearly mixed into
    /// two observed features.
    fn mixed_signal(n: usize) -> Array2<f64> {
        let slow_omega = 0.01;
        let fast_omega = 0.8;
        Array2::from_shape_fn((n, 2), |(t, k)| {
            let slow = (slow_omega * t as f64).cos();
            let fast = (fast_omega * t as f64).cos();
            if k == 0 { slow + 0.3 * fast } else { slow - 0.3 * fast }
        })
    }

    #[test]
    // Purpose
    // -------
    // Constructor validation of every knob, including the mutual
    // exclusivity of dim and var_cutoff.
    //
    // Given
    // -----
    // - One invalid value per knob.
    //
    // Expect
    // ------
    // - The matching error variant for each; with_lag succeeds and applies
    //   the documented defaults.
    fn options_are_validated() {
        assert!(matches!(
            TicaOptions::new(0, None, None, true, 1e-6, None, 1, 100).unwrap_err(),
            TicaError::InvalidLag { .. }
        ));
        assert!(matches!(
            TicaOptions::new(5, Some(2), Some(0.9), true, 1e-6, None, 1, 100).unwrap_err(),
            TicaError::MutuallyExclusiveDim { .. }
        ));
        assert!(matches!(
            TicaOptions::new(5, Some(0), None, true, 1e-6, None, 1, 100).unwrap_err(),
            TicaError::InvalidDim { dim: 0 }
        ));
        assert!(matches!(
            TicaOptions::new(5, None, Some(1.5), true, 1e-6, None, 1, 100).unwrap_err(),
            TicaError::InvalidVarCutoff { .. }
        ));
        assert!(matches!(
            TicaOptions::new(5, None, None, true, 0.0, None, 1, 100).unwrap_err(),
            TicaError::InvalidEpsilon { .. }
        ));
        assert!(matches!(
            TicaOptions::new(5, None, None, true, 1e-6, None, 0, 100).unwrap_err(),
            TicaError::InvalidStride { .. }
        ));
        assert!(matches!(
            TicaOptions::new(5, None, None, true, 1e-6, None, 1, 0).unwrap_err(),
            TicaError::InvalidChunkSize { .. }
        ));

        let defaults = TicaOptions::with_lag(5).unwrap();
        assert_relative_eq!(defaults.var_cutoff, DEFAULT_VAR_CUTOFF);
        assert!(defaults.kinetic_map);
        assert_eq!(defaults.stride, 1);

        // explicit dim forces the cutoff to 1.0
        let fixed = TicaOptions::new(5, Some(1), None, true, 1e-6, None, 1, 100).unwrap();
        assert_relative_eq!(fixed.var_cutoff, 1.0);
    }

    #[test]
    // Purpose
    // -------
    // TICA recovers the slow direction of a mixed two-feature signal: the
    // leading eigenvalue dominates and the leading eigenvector aligns with
    // the symmetric combination carrying the slow oscillation.
    //
    // Given
    // -----
    // - 4000 frames of the deterministic mixed signal, lag 10.
    //
    // Expect
    // ------
    // - Descending eigenvalue magnitudes; leading eigenvector parallel to
    //   (1, 1) up to normalization; cumvar ends at 1.
    fn recovers_slow_direction_of_mixed_signal() {
        // Arrange
        let data = mixed_signal(4000);
        let tica = Tica::new(TicaOptions::with_lag(10).unwrap());

        // Act
        let model = tica.estimate(std::slice::from_ref(&data)).unwrap();

        // Assert
        let values = model.eigenvalues();
        for w in values.windows(2) {
            assert!(w[0].abs() >= w[1].abs() - 1e-12);
        }
        let lead = model.eigenvectors().column(0);
        let ratio = lead[0] / lead[1];
        assert_relative_eq!(ratio, 1.0, epsilon = 0.05);
        let cumvar = model.cumvar();
        assert_relative_eq!(cumvar[cumvar.len() - 1], 1.0, epsilon = 1e-12);
        assert!(model.warnings().is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Dimension resolution: an explicit dim wins; a variance cutoff picks
    // the smallest dimension reaching it; the slow/fast split makes one
    // dimension carry almost all kinetic variance.
    //
    // Given
    // -----
    // - The mixed signal, estimated with dim = 2 and with var_cutoff 0.9.
    //
    // Expect
    // ------
    // - dimension() == 2 with the explicit dim; dimension() == 1 under the
    //   cutoff (the slow component dominates).
    fn dimension_resolution_via_both_knobs() {
        // Arrange
        let data = mixed_signal(4000);
        let explicit = Tica::new(
            TicaOptions::new(10, Some(2), None, true, 1e-6, None, 1, DEFAULT_CHUNK_SIZE).unwrap(),
        );
        let cutoff = Tica::new(
            TicaOptions::new(10, None, Some(0.9), true, 1e-6, None, 1, DEFAULT_CHUNK_SIZE)
                .unwrap(),
        );

        // Act
        let model_explicit = explicit.estimate(std::slice::from_ref(&data)).unwrap();
        let model_cutoff = cutoff.estimate(std::slice::from_ref(&data)).unwrap();

        // Assert
        assert_eq!(model_explicit.dimension(), 2);
        assert_eq!(model_cutoff.dimension(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Kinetic-map scaling multiplies each projected column by its
    // eigenvalue and nothing else.
    //
    // Given
    // -----
    // - Two models differing only in kinetic_map, applied to the same
    //   probe chunk.
    //
    // Expect
    // ------
    // - transform_kinetic[:, j] == eigenvalue_j * transform_plain[:, j].
    fn kinetic_map_scales_by_eigenvalues() {
        // Arrange
        let data = mixed_signal(2000);
        let plain = Tica::new(
            TicaOptions::new(10, Some(2), None, false, 1e-6, None, 1, DEFAULT_CHUNK_SIZE)
                .unwrap(),
        );
        let kinetic = Tica::new(
            TicaOptions::new(10, Some(2), None, true, 1e-6, None, 1, DEFAULT_CHUNK_SIZE).unwrap(),
        );
        let probe = data.slice(s![..50, ..]).to_owned();

        // Act
        let model_plain = plain.estimate(std::slice::from_ref(&data)).unwrap();
        let model_kinetic = kinetic.estimate(std::slice::from_ref(&data)).unwrap();
        let y_plain = model_plain.transform(&probe).unwrap();
        let y_kinetic = model_kinetic.transform(&probe).unwrap();

        // Assert
        let values = model_plain.eigenvalues();
        for j in 0..2 {
            for t in 0..probe.nrows() {
                assert_relative_eq!(
                    y_kinetic[[t, j]],
                    values[j] * y_plain[[t, j]],
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Trajectories shorter than the lag are skipped and surfaced; only a
    // uniformly short input is fatal. The stride shortens trajectories
    // before the comparison.
    //
    // Given
    // -----
    // - One long and one 5-frame trajectory at lag 10, then the short one
    //   alone, then a strided estimate that pushes the long one under the
    //   lag.
    //
    // Expect
    // ------
    // - Skip index [1] plus a warning; DegenerateData for the short-only
    //   and over-strided inputs.
    fn short_trajectories_are_skipped_not_fatal() {
        // Arrange
        let long = mixed_signal(500);
        let short = mixed_signal(5);
        let tica = Tica::new(TicaOptions::with_lag(10).unwrap());

        // Act
        let model = tica.estimate(&[long.clone(), short.clone()]).unwrap();

        // Assert
        assert_eq!(model.skipped_trajectories(), &[1]);
        assert!(matches!(
            model.warnings(),
            [Warning::SkippedTrajectories { indices }] if indices == &vec![1]
        ));
        assert!(matches!(
            tica.estimate(std::slice::from_ref(&short)).unwrap_err(),
            TicaError::DegenerateData { .. }
        ));

        let strided = Tica::new(
            TicaOptions::new(10, None, None, true, 1e-6, None, 100, DEFAULT_CHUNK_SIZE).unwrap(),
        );
        assert!(matches!(
            strided.estimate(std::slice::from_ref(&long)).unwrap_err(),
            TicaError::DegenerateData { .. }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Estimation is idempotent: identical data in identical order gives
    // identical means, covariances, and eigenvalues; chunked estimation
    // agrees with single-chunk estimation to floating tolerance.
    //
    // Given
    // -----
    // - The mixed signal estimated twice, and once with a small chunk
    //   size.
    //
    // Expect
    // ------
    // - Exact equality across repeated runs; agreement within 1e-8 across
    //   chunkings.
    fn estimation_is_idempotent_and_chunking_insensitive() {
        // Arrange
        let data = mixed_signal(1000);
        let tica = Tica::new(TicaOptions::with_lag(5).unwrap());
        let chunked = Tica::new(
            TicaOptions::new(5, None, None, true, 1e-6, None, 1, 64).unwrap(),
        );

        // Act
        let a = tica.estimate(std::slice::from_ref(&data)).unwrap();
        let b = tica.estimate(std::slice::from_ref(&data)).unwrap();
        let c = chunked.estimate(std::slice::from_ref(&data)).unwrap();

        // Assert
        assert_eq!(a.eigenvalues(), b.eigenvalues());
        assert_eq!(a.cov(), b.cov());
        assert_eq!(a.mean(), b.mean());
        for (x, y) in a.eigenvalues().iter().zip(c.eigenvalues().iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-8);
        }
        for (x, y) in a.cov().iter().zip(c.cov().iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // A precomputed mean overrides the estimated one in the model and its
    // transform; transform rejects mismatched input dimensions.
    //
    // Given
    // -----
    // - A zero precomputed mean on data with nonzero empirical mean.
    //
    // Expect
    // ------
    // - model.mean() is the supplied mean; transform of a 3-column probe
    //   fails with ShapeMismatch; a wrong-length mean fails construction
    //   of the estimate.
    fn precomputed_mean_and_transform_validation() {
        // Arrange
        let data = mixed_signal(500) + 2.5;
        let supplied = Array1::<f64>::zeros(2);
        let tica = Tica::new(
            TicaOptions::new(
                5,
                None,
                None,
                true,
                1e-6,
                Some(supplied.clone()),
                1,
                DEFAULT_CHUNK_SIZE,
            )
            .unwrap(),
        );

        // Act
        let model = tica.estimate(std::slice::from_ref(&data)).unwrap();

        // Assert
        assert_eq!(model.mean(), &supplied);
        assert!(matches!(
            model.transform(&Array2::<f64>::zeros((4, 3))).unwrap_err(),
            TicaError::ShapeMismatch { context: "transform input", .. }
        ));

        let bad_mean = Tica::new(
            TicaOptions::new(
                5,
                None,
                None,
                true,
                1e-6,
                Some(Array1::<f64>::zeros(7)),
                1,
                DEFAULT_CHUNK_SIZE,
            )
            .unwrap(),
        );
        assert!(matches!(
            bad_mean.estimate(std::slice::from_ref(&data)).unwrap_err(),
            TicaError::InvalidMeanLength { expected: 2, found: 7 }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Timescales follow -lag / ln|lambda| for the model's eigenvalues.
    //
    // Given
    // -----
    // - A model of the mixed signal at lag 10.
    //
    // Expect
    // ------
    // - Elementwise agreement with the closed form; the slow timescale
    //   exceeds the fast one.
    fn timescales_follow_closed_form() {
        // Arrange
        let data = mixed_signal(3000);
        let tica = Tica::new(TicaOptions::with_lag(10).unwrap());

        // Act
        let model = tica.estimate(std::slice::from_ref(&data)).unwrap();
        let ts = model.timescales();

        // Assert
        for (t, &l) in ts.iter().zip(model.eigenvalues().iter()) {
            assert_relative_eq!(*t, -10.0 / l.abs().ln(), epsilon = 1e-12);
        }
        if ts.len() == 2 {
            assert!(ts[0] > ts[1]);
        }
    }
}
