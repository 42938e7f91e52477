//! tica — time-lagged independent component analysis.
//!
//! Purpose
//! -------
//! Reduce the dimensionality of multivariate time series by projecting
//! onto the slowest linearly identifiable coordinates. The subtree streams
//! chunked data into a numerically stable covariance accumulator, solves a
//! regularized generalized eigenproblem, and exposes the projection as an
//! immutable model.
//!
//! Key behaviors
//! -------------
//! - [`moments`] accumulates mean, instantaneous, and time-lagged
//!   covariances over chunks with Chan-style merging and a logarithmically
//!   bounded partial stack.
//! - [`eig`] solves `Ct r = lambda C0 r` with rank truncation of
//!   ill-conditioned covariance directions.
//! - [`estimator`] orchestrates both and resolves the output dimension
//!   from an explicit count or a cumulative kinetic-variance cutoff.
//!
//! Invariants & assumptions
//! ------------------------
//! - Chunk order is deterministic and part of the numerical contract.
//! - Models are value objects: estimation builds them once, accessors
//!   borrow, and nothing mutates them afterwards.
//!
//! Downstream usage
//! ----------------
//! - Typical code imports the surface through the prelude:
//!
//!   ```rust
//!   use ndarray::Array2;
//!   use rust_msm::tica::prelude::*;
//!
//!   let data = Array2::<f64>::from_shape_fn((100, 2), |(t, k)| {
//!       ((t + k) as f64 * 0.1).sin()
//!   });
//!   let tica = Tica::new(TicaOptions::with_lag(5)?);
//!   let model = tica.estimate(std::slice::from_ref(&data))?;
//!   let projected = model.transform(&data)?;
//!   # let _ = projected;
//!   # Ok::<(), rust_msm::tica::errors::TicaError>(())
//!   ```
//!
//! Testing notes
//! -------------
//! - Submodule unit tests pin the accumulator algebra, the eigensolver
//!   contract, and the estimator semantics; `tests/integration_tica_pipeline.rs`
//!   exercises the composed flow on synthetic signals.

pub mod eig;
pub mod errors;
pub mod estimator;
pub mod moments;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{TicaError, TicaResult};
pub use self::estimator::{Tica, TicaModel, TicaOptions};
pub use self::moments::{AccumulatorState, Covariances, RunningCovar};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_msm::tica::prelude::*;
//
// to import the main TICA surface in a single line.

pub mod prelude {
    pub use super::eig::eig_corr;
    pub use super::errors::{TicaError, TicaResult};
    pub use super::estimator::{Tica, TicaModel, TicaOptions};
    pub use super::moments::{nsave_for_chunks, AccumulatorState, Covariances, RunningCovar};
}
