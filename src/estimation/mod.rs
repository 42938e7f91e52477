//! estimation — Markov state model estimation from discretized trajectories.
//!
//! Purpose
//! -------
//! Provide the full path from discretized trajectories to an estimated
//! transition matrix: transition counting at a fixed lag, connectivity
//! analysis of the count graph, pseudo-count priors, maximum-likelihood
//! estimation with and without the detailed-balance constraint, and the
//! likelihood/error-propagation utilities around the estimate.
//!
//! Key behaviors
//! -------------
//! - One matrix abstraction, [`SquareMatrix`], dispatched on once per entry
//!   point; results mirror the representation of the inputs.
//! - The usual pipeline composes the submodules in order:
//!   [`count_matrix`](count_matrix::count_matrix) ->
//!   [`largest_connected_submatrix`](connectivity::largest_connected_submatrix)
//!   -> [`prior_neighbor`](prior::prior_neighbor) ->
//!   [`transition_matrix`](transition_matrix::transition_matrix) ->
//!   [`log_likelihood`](likelihood::log_likelihood).
//! - Diagnostics travel as data: outcomes carry `converged`, iteration
//!   counts, optional histories, and [`Warning`](crate::diagnostics::Warning)
//!   lists instead of writing to a logger.
//!
//! Invariants & assumptions
//! ------------------------
//! - Count matrices are square and nonnegative; estimators validate the
//!   constraints they need (positive row sums for reversible estimation)
//!   and report violations through [`EstimationError`], never panics.
//! - All computation is synchronous, single-threaded, and in-memory.
//!
//! Downstream usage
//! ----------------
//! - Typical code imports the surface through the prelude:
//!
//!   ```rust
//!   use rust_msm::estimation::prelude::*;
//!
//!   let c = count_matrix(&[0, 0, 1, 1, 0, 0, 1, 1], 1, true)?;
//!   let outcome = transition_matrix(&c, true, None, &EstimatorOptions::default())?;
//!   # Ok::<(), rust_msm::estimation::errors::EstimationError>(())
//!   ```
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own contract; the
//!   `tests/integration_msm_pipeline.rs` suite exercises the composed
//!   pipeline on synthetic trajectories.

pub mod connectivity;
pub mod count_matrix;
pub mod errors;
pub mod likelihood;
pub mod matrix;
pub mod prior;
pub mod transition_matrix;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{EstResult, EstimationError};
pub use self::matrix::{CooMatrix, SquareMatrix};
pub use self::transition_matrix::{EstimateOutcome, EstimatorOptions};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_msm::estimation::prelude::*;
//
// to import the main estimation surface in a single line.

pub mod prelude {
    pub use super::connectivity::{
        connected_sets, is_connected, largest_connected_set, largest_connected_submatrix,
    };
    pub use super::count_matrix::{count_matrix, count_matrix_cores, count_matrix_mult};
    pub use super::errors::{EstResult, EstimationError};
    pub use super::likelihood::{
        error_perturbation, error_perturbation_tensor, log_likelihood, tmatrix_cov,
        tmatrix_cov_row,
    };
    pub use super::matrix::{CooMatrix, SquareMatrix};
    pub use super::prior::{prior_const, prior_neighbor, prior_rev};
    pub use super::transition_matrix::{transition_matrix, EstimateOutcome, EstimatorOptions};
}
