//! rust_msm — Markov state model estimation and TICA in Rust.
//!
//! Purpose
//! -------
//! Serve as the crate root for the two numerical subtrees: Markov state
//! model estimation from discretized trajectories (`estimation`) and
//! time-lagged independent component analysis of multivariate time series
//! (`tica`), together with the structured diagnostics channel they share
//! (`diagnostics`).
//!
//! Key behaviors
//! -------------
//! - Re-export the core subtrees as the public crate surface; each subtree
//!   carries a `prelude` module for one-line imports.
//! - Keep all heavy numerical work in the subtrees; this file only wires
//!   the module tree together.
//!
//! Invariants & assumptions
//! ------------------------
//! - All computation is synchronous, single-threaded, CPU-bound, and
//!   in-memory; the crate performs no I/O.
//! - Estimators never retain references to caller inputs: outputs are new
//!   values, and dense/sparse conversions always copy.
//! - Recoverable conditions are reported through the subtree error enums
//!   ([`estimation::errors::EstimationError`], [`tica::errors::TicaError`])
//!   or through [`diagnostics::Warning`] lists in outcome structs; no
//!   global logging state exists.
//!
//! Conventions
//! -----------
//! - Matrices and vectors are `ndarray` types throughout; `nalgebra` is an
//!   internal implementation detail of the eigensolvers.
//! - Row index = source state / time frame, column index = target state /
//!   feature, in both subtrees.
//!
//! Downstream usage
//! ----------------
//! - Markov-model pipelines compose `estimation::prelude::*`: counting,
//!   connectivity, priors, maximum-likelihood estimation, and likelihood
//!   utilities.
//! - Dimensionality-reduction pipelines use `tica::prelude::*`: options,
//!   the estimator, and the immutable projection model.
//!
//! Testing notes
//! -------------
//! - Every module carries `#[cfg(test)]` unit tests for its local
//!   contract; the `tests/` directory exercises the end-to-end pipelines
//!   on synthetic trajectories and signals.

pub mod diagnostics;
pub mod estimation;
pub mod tica;

pub use diagnostics::Warning;
