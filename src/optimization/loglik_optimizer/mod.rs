//! loglik_optimizer — maximum-likelihood driver on top of Argmin.
//!
//! Purpose
//! -------
//! Maximize user-supplied log-likelihoods with a choice of derivative-free,
//! quasi-Newton, conjugate-gradient, and stochastic solvers, returning a
//! normalized outcome with a 0/1/2 convergence code.
//!
//! Key behaviors
//! -------------
//! - [`LogLikelihood`] is the model-side contract: `value`, `check`, and
//!   optional analytic `grad`/`hessian` of `ℓ(θ)`.
//! - [`maximize`] minimizes `c(θ) = −ℓ(θ)` through [`adapter::ArgMinAdapter`],
//!   with infeasible points mapped to `+∞`.
//! - [`finite_diff`] supplies numerical gradients and the curvature used for
//!   standard errors.
//!
//! Conventions
//! -----------
//! - `OptimOutcome::value` is the log-likelihood at `θ̂`, not the cost.
//! - Argmin types never leak through the public signatures except the
//!   solver aliases in [`types`].
pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::finite_diff::numerical_curvature;
pub use self::traits::{
    AnnealOptions, Convergence, LineSearcher, LogLikelihood, MLEOptions, OptimMethod,
    OptimOutcome, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use bipartite_dm::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{
        Convergence, LogLikelihood, MLEOptions, OptimMethod, OptimOutcome, Tolerances,
    };
    pub use super::types::{Cost, Grad, Hessian, Theta};
}
