//! inference — standard errors and Wald statistics for fitted models.
//!
//! Purpose
//! -------
//! Turn the curvature matrix of a fit into a covariance matrix and a
//! results table, degrading to "unavailable" fields instead of failing
//! when the curvature cannot be inverted.
//!
//! Key behaviors
//! -------------
//! - [`covariance::invert_curvature`]: Cholesky inversion with `nalgebra`
//!   after a positive-definiteness and conditioning check.
//! - [`InferenceReport`]: estimates, standard errors, z, p-values, and Wald
//!   intervals keyed by coefficient name, with presentation rounding.
//! - [`InferenceError`] / [`InferenceResult`]: failure reasons stored in the
//!   report's fields.
//!
//! Conventions
//! -----------
//! - Curvature is the Hessian of the *negative* log-likelihood at `θ̂`, in
//!   the natural parameter space (`ρ` itself, although the optimizer works
//!   on `logit(ρ)`).
//! - A curvature that is not positive definite, or is numerically singular,
//!   makes every coefficient's Wald statistics unavailable.
pub mod covariance;
pub mod errors;
pub mod report;

pub use self::errors::{InferenceError, InferenceResult};
pub use self::report::{CoefficientSummary, InferenceReport, WaldStats};
