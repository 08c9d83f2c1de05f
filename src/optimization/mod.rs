//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer for fitting the network models: an
//! Argmin-backed log-likelihood maximizer, numerically stable special
//! functions and transforms, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` with Nelder–Mead, BFGS, L-BFGS,
//!   conjugate gradient, or simulated annealing, and compute numerical
//!   curvature at the optimum.
//! - `numerical_stability`: rising-factorial log-gamma sums and their
//!   derivatives, softmax and log-sum-exp, and the `ρ ↔ c` dispersion map.
//! - `errors`: [`errors::OptError`] and [`errors::OptResult`], including
//!   conversions from Argmin errors and model errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = −ℓ(θ)`; user-facing
//!   outcomes are expressed in terms of `ℓ`.
//! - Invalid states are reported as `OptError`, not panics.
//!
//! Downstream usage
//! ----------------
//! - `model` implements `LogLikelihood` for the network models and
//!   `estimation` drives `maximize`.
pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use bipartite_dm::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
