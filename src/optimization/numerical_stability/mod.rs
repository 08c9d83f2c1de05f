//! numerical_stability — special functions and guarded transforms.
//!
//! Purpose
//! -------
//! Collect the scalar numerics the network likelihoods depend on: log-gamma,
//! digamma and trigamma *rising differences*, a standalone trigamma, and
//! max-shifted softmax / log-sum-exp, plus the logit map behind the
//! intra-group correlation parameterization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Counts passed to the rising-difference helpers are finite,
//!   non-negative integers (validated when a `ModelSpec` is built).
//! - Nothing here returns `Result`: infeasible inputs produce `±∞`/`NaN`
//!   arithmetically and the likelihood layer maps a non-finite objective to
//!   `+∞`.
//!
//! Conventions
//! -----------
//! - Pure functions over `f64` and `ndarray` views; no logging, no I/O.
//!
//! Testing notes
//! -------------
//! - Closed-form values for trigamma, agreement of summed rising
//!   differences with `statrs` differences on both sides of the cutoff, and
//!   overflow behavior of softmax for extreme predictors.

pub mod special;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::special::{
    RISING_SUM_CUTOFF, digamma_rising, ln_factorial, ln_gamma_rising, trigamma, trigamma_rising,
};
pub use self::transformations::{log_sum_exp, logistic, logit, rho_concentration, softmax};

pub mod prelude {
    pub use super::special::{digamma_rising, ln_gamma_rising, trigamma, trigamma_rising};
    pub use super::transformations::{log_sum_exp, rho_concentration, softmax};
}
